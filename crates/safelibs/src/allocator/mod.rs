//! Canary-protected allocation primitives.
//!
//! [`CanaryAllocator`] layers the `malloc`/`calloc`/`realloc`/`free` contract
//! over a [`Backend`]. The free functions at the bottom of this module pick the
//! backend chosen at init (mapped unless disabled by configuration) and are
//! what the C ABI calls.

pub mod backend;
pub mod block;
pub mod mapped;
pub mod system;

pub use backend::Backend;
pub use block::{AllocationHeader, Block, HEADER_SIZE};
pub use mapped::MappedBackend;
pub use system::SystemBackend;

use crate::error::{Error, Result};
use crate::hardening::poison;
use crate::init::{self, STATE_DISABLED, STATE_READY};
use crate::mem;
use crate::util::MIN_ALIGN;
use core::ptr::NonNull;

/// Result of [`CanaryAllocator::realloc`].
#[derive(Debug)]
pub struct Reallocation {
    /// The new block, poisoned unless `realloc-copy` is enabled.
    pub ptr: NonNull<u8>,
    /// Outcome of releasing the old block. The old block is gone either way;
    /// an `Err` means its header had been damaged.
    pub released: Result<()>,
}

pub struct CanaryAllocator<B: Backend> {
    backend: B,
}

impl<B: Backend> CanaryAllocator<B> {
    pub const fn new(backend: B) -> Self {
        CanaryAllocator { backend }
    }

    /// Allocate `length` bytes aligned to `alignment`. Fresh mappings are
    /// zero-filled; nothing else is written to the payload.
    pub fn alloc(&self, alignment: usize, length: usize) -> Result<NonNull<u8>> {
        self.backend.allocate(alignment, length)
    }

    /// Allocate `length` bytes and fill them with the clobber byte, so reads of
    /// uninitialized memory are visibly wrong instead of silently zero.
    pub fn malloc(&self, length: usize) -> Result<NonNull<u8>> {
        let ptr = self.alloc(MIN_ALIGN, length)?;
        unsafe { poison::poison_region(ptr.as_ptr(), length) };
        Ok(ptr)
    }

    /// Allocate `nmemb * size` zeroed bytes. Overflow is out-of-memory.
    pub fn calloc(&self, nmemb: usize, size: usize) -> Result<NonNull<u8>> {
        let total = nmemb.checked_mul(size).ok_or(Error::OutOfMemory(usize::MAX))?;
        let ptr = self.malloc(total)?;
        unsafe { mem::zero_raw(ptr.as_ptr(), total) };
        Ok(ptr)
    }

    /// Allocate a new block of `length` bytes, then release `old`.
    ///
    /// The old contents are not carried over unless the `realloc-copy`
    /// feature is enabled. If the new allocation fails, `old` is untouched.
    ///
    /// # Safety
    /// `old` must be null or a live pointer from this allocator.
    pub unsafe fn realloc(&self, old: *mut u8, length: usize) -> Result<Reallocation> {
        let ptr = self.malloc(length)?;
        let released = match NonNull::new(old) {
            None => Ok(()),
            Some(old) => {
                #[cfg(feature = "realloc-copy")]
                if let Some(old_len) = self.backend.requested_len(old) {
                    core::ptr::copy_nonoverlapping(old.as_ptr(), ptr.as_ptr(), old_len.min(length));
                }
                self.backend.release(old)
            }
        };
        Ok(Reallocation { ptr, released })
    }

    /// Release `ptr`. Null is a no-op.
    ///
    /// A damaged header is reported as [`Error::Corruption`] after the block
    /// has been released.
    ///
    /// # Safety
    /// `ptr` must be null or a live pointer from this allocator.
    pub unsafe fn free(&self, ptr: *mut u8) -> Result<()> {
        match NonNull::new(ptr) {
            None => Ok(()),
            Some(ptr) => self.backend.release(ptr),
        }
    }

    /// The length originally requested for `ptr`, if the backend records it.
    ///
    /// # Safety
    /// `ptr` must be a live pointer from this allocator.
    pub unsafe fn requested_size(&self, ptr: NonNull<u8>) -> Option<usize> {
        self.backend.requested_len(ptr)
    }
}

/// Dispatch macro: check init state and route to the mapped or system backend.
macro_rules! dispatch {
    ($a:ident => $body:expr) => {{
        match init::state() {
            STATE_READY => {
                let $a = init::mapped();
                $body
            }
            STATE_DISABLED => {
                let $a = init::system();
                $body
            }
            _ => {
                init::ensure_initialized();
                match init::state() {
                    STATE_READY => {
                        let $a = init::mapped();
                        $body
                    }
                    _ => {
                        let $a = init::system();
                        $body
                    }
                }
            }
        }
    }};
}

/// [`CanaryAllocator::alloc`] on the process-wide allocator.
pub fn alloc(alignment: usize, length: usize) -> Result<NonNull<u8>> {
    dispatch!(a => a.alloc(alignment, length))
}

/// [`CanaryAllocator::malloc`] on the process-wide allocator.
pub fn malloc(length: usize) -> Result<NonNull<u8>> {
    dispatch!(a => a.malloc(length))
}

/// [`CanaryAllocator::calloc`] on the process-wide allocator.
pub fn calloc(nmemb: usize, size: usize) -> Result<NonNull<u8>> {
    dispatch!(a => a.calloc(nmemb, size))
}

/// [`CanaryAllocator::realloc`] on the process-wide allocator.
///
/// # Safety
/// `old` must be null or a live pointer from this module's functions.
pub unsafe fn realloc(old: *mut u8, length: usize) -> Result<Reallocation> {
    dispatch!(a => a.realloc(old, length))
}

/// [`CanaryAllocator::free`] on the process-wide allocator.
///
/// # Safety
/// `ptr` must be null or a live pointer from this module's functions.
pub unsafe fn free(ptr: *mut u8) -> Result<()> {
    dispatch!(a => a.free(ptr))
}

/// [`CanaryAllocator::requested_size`] on the process-wide allocator.
///
/// # Safety
/// `ptr` must be a live pointer from this module's functions.
pub unsafe fn requested_size(ptr: NonNull<u8>) -> Option<usize> {
    dispatch!(a => a.requested_size(ptr))
}
