use super::backend::Backend;
use super::block::{Block, Validation};
use crate::error::{Error, Result};
use crate::hardening::{self, poison};
use crate::util::{is_aligned, page_size, MIN_ALIGN};
use crate::{config, platform};
use core::ptr::NonNull;

/// Backend that maps anonymous memory per allocation and keeps the
/// allocation header inline, in front of the payload.
pub struct MappedBackend;

impl Backend for MappedBackend {
    fn allocate(&self, alignment: usize, length: usize) -> Result<NonNull<u8>> {
        if alignment != 0 && !alignment.is_power_of_two() {
            return Err(Error::InvalidAlignment(alignment));
        }
        let align = alignment.max(MIN_ALIGN);
        if align > page_size() {
            return Err(Error::InvalidAlignment(alignment));
        }

        let prefix = Block::prefix_for(align);
        let mapped_len = Block::mapped_len(prefix, length).ok_or(Error::OutOfMemory(length))?;

        let base = unsafe { platform::map_anonymous(mapped_len) };
        let base = NonNull::new(base).ok_or(Error::OutOfMemory(length))?;

        let block = unsafe { Block::create(base, prefix, length) };
        debug_assert!(is_aligned(block.payload().as_ptr() as usize, align));
        Ok(block.payload())
    }

    unsafe fn release(&self, ptr: NonNull<u8>) -> Result<()> {
        let block = Block::from_payload(ptr);
        let addr = ptr.as_ptr() as usize;

        let header = block.header_addr();
        match block.validate() {
            Validation::Intact { length, mapped_len } => {
                poison::poison_region(header as *mut u8, (addr - header) + length);
                platform::unmap(block.base().as_ptr(), mapped_len);
                Ok(())
            }
            Validation::CanaryMismatch { .. } | Validation::LengthCorrupt => {
                report_corruption(addr);
                // Only the page holding the header is provably ours; any
                // further pages of this block are leaked.
                let first_page_end = block.base().as_ptr() as usize + page_size();
                poison::poison_region(header as *mut u8, first_page_end - header);
                platform::unmap(block.base().as_ptr(), page_size());
                Err(Error::Corruption { addr })
            }
        }
    }

    unsafe fn requested_len(&self, ptr: NonNull<u8>) -> Option<usize> {
        match Block::from_payload(ptr).validate() {
            Validation::Intact { length, .. } => Some(length),
            _ => None,
        }
    }
}

#[cold]
fn report_corruption(addr: usize) {
    if config::abort_on_corruption() {
        hardening::abort_with_message("safelibs: heap corruption detected (canary mismatch)\n");
    }
    log::error!("safelibs: damaged header freeing {:#x}; releasing first page", addr);
}
