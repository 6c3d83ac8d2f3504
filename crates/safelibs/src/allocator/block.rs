//! The header+payload record of the mapped backend.
//!
//! Layout of one mapping (page-granular, zero-filled by the kernel):
//!
//! ```text
//! base                         payload
//! |  pad  | length | canary |  payload bytes ...  | slack to page end |
//!         \---- header ----/
//! ```
//!
//! The canary sits directly in front of the payload, so any underflow into
//! the header crosses it first. It is keyed on both the header address and
//! the stored length, so the length is only trusted once the canary checks.
//! A damaged header vouches for nothing past the first page. `prefix` (payload − base) is at least the
//! header size and at most one page, so the base is always recoverable from
//! a payload pointer by rounding down.

use crate::error::{Error, Result};
use crate::hardening::canary;
use crate::util::{align_down, checked_align_up, page_size};
use core::mem::size_of;
use core::ptr::NonNull;

/// Inline metadata written in front of every mapped payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct AllocationHeader {
    /// Originally requested payload size.
    pub length: usize,
    /// Keyed over the header address and `length`; see [`canary::canary_for`].
    pub canary: u64,
}

pub const HEADER_SIZE: usize = size_of::<AllocationHeader>();

/// Outcome of validating a block's header at release time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Validation {
    /// Canary matches; `mapped_len` is the full mapping size.
    Intact { length: usize, mapped_len: usize },
    /// Canary does not match the stored length. `length` is what the header
    /// claims and is not to be trusted.
    CanaryMismatch { length: usize },
    /// The header is unreadable, or passes the canary yet describes no
    /// mapping we could have made.
    LengthCorrupt,
}

/// One mapping holding a header and its payload.
#[derive(Clone, Copy, Debug)]
pub struct Block {
    base: NonNull<u8>,
    prefix: usize,
}

impl Block {
    /// Offset of the payload from the mapping base for `align`.
    /// `align` must be a power of two no larger than the page size.
    #[inline]
    pub fn prefix_for(align: usize) -> usize {
        crate::util::align_up(HEADER_SIZE, align)
    }

    /// Size of the mapping needed for `length` payload bytes behind `prefix`.
    #[inline]
    pub fn mapped_len(prefix: usize, length: usize) -> Option<usize> {
        let total = prefix.checked_add(length)?;
        let rounded = checked_align_up(total, page_size())?;
        if rounded > isize::MAX as usize {
            return None;
        }
        Some(rounded)
    }

    /// Write a fresh header into a new mapping and describe it.
    ///
    /// # Safety
    /// `base` must be the start of a writable mapping of at least
    /// `Block::mapped_len(prefix, length)` bytes.
    pub unsafe fn create(base: NonNull<u8>, prefix: usize, length: usize) -> Self {
        let block = Block { base, prefix };
        let header = AllocationHeader {
            length,
            canary: canary::canary_for(block.header_addr(), length),
        };
        (block.header_ptr() as *mut AllocationHeader).write_unaligned(header);
        block
    }

    /// Recover the block record from a payload pointer we handed out.
    ///
    /// # Safety
    /// `payload` must have been returned by the mapped backend and not yet
    /// released.
    pub unsafe fn from_payload(payload: NonNull<u8>) -> Self {
        let addr = payload.as_ptr() as usize;
        let base_addr = align_down(addr - HEADER_SIZE, page_size());
        let prefix = addr - base_addr;
        Block {
            base: NonNull::new_unchecked(payload.as_ptr().sub(prefix)),
            prefix,
        }
    }

    #[inline]
    pub fn base(&self) -> NonNull<u8> {
        self.base
    }

    #[inline]
    pub fn payload(&self) -> NonNull<u8> {
        unsafe { NonNull::new_unchecked(self.base.as_ptr().add(self.prefix)) }
    }

    #[inline]
    pub fn header_addr(&self) -> usize {
        self.base.as_ptr() as usize + self.prefix - HEADER_SIZE
    }

    #[inline]
    fn header_ptr(&self) -> *mut u8 {
        unsafe { self.base.as_ptr().add(self.prefix - HEADER_SIZE) }
    }

    /// The bytes between the mapping base and the payload.
    ///
    /// # Safety
    /// The block must still be mapped.
    unsafe fn prefix_bytes(&self) -> &[u8] {
        core::slice::from_raw_parts(self.base.as_ptr(), self.prefix)
    }

    /// Read the header through a bounds-checked view of the prefix.
    ///
    /// # Safety
    /// The block must still be mapped.
    pub unsafe fn header(&self) -> Result<AllocationHeader> {
        let start = self
            .prefix
            .checked_sub(HEADER_SIZE)
            .ok_or(Error::Corruption { addr: self.payload().as_ptr() as usize })?;
        let bytes = self
            .prefix_bytes()
            .get(start..self.prefix)
            .ok_or(Error::Corruption { addr: self.payload().as_ptr() as usize })?;
        Ok((bytes.as_ptr() as *const AllocationHeader).read_unaligned())
    }

    /// Validate the header against the canary and the mapping arithmetic.
    ///
    /// # Safety
    /// The block must still be mapped.
    pub unsafe fn validate(&self) -> Validation {
        let header = match self.header() {
            Ok(h) => h,
            Err(_) => return Validation::LengthCorrupt,
        };
        if !canary::check_canary(self.header_addr(), header.length, header.canary) {
            return Validation::CanaryMismatch {
                length: header.length,
            };
        }
        match Self::mapped_len(self.prefix, header.length) {
            Some(mapped_len) => Validation::Intact {
                length: header.length,
                mapped_len,
            },
            None => Validation::LengthCorrupt,
        }
    }
}
