use super::backend::Backend;
use crate::error::{Error, Result};
use crate::util::MIN_ALIGN;
use core::ptr::{self, NonNull};

/// Passthrough backend over the system allocator.
///
/// Used when the mapped backend is disabled at runtime. There is no header,
/// so corruption is never detected here.
pub struct SystemBackend;

impl Backend for SystemBackend {
    fn allocate(&self, alignment: usize, length: usize) -> Result<NonNull<u8>> {
        if alignment != 0 && !alignment.is_power_of_two() {
            return Err(Error::InvalidAlignment(alignment));
        }
        let align = alignment.max(MIN_ALIGN);
        let mut out: *mut libc::c_void = ptr::null_mut();
        let ret = unsafe { libc::posix_memalign(&mut out, align, length.max(1)) };
        match ret {
            0 => NonNull::new(out as *mut u8).ok_or(Error::OutOfMemory(length)),
            libc::EINVAL => Err(Error::InvalidAlignment(alignment)),
            _ => Err(Error::OutOfMemory(length)),
        }
    }

    unsafe fn release(&self, ptr: NonNull<u8>) -> Result<()> {
        libc::free(ptr.as_ptr() as *mut libc::c_void);
        Ok(())
    }

    unsafe fn requested_len(&self, _ptr: NonNull<u8>) -> Option<usize> {
        None
    }
}
