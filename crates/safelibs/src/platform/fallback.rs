use crate::error::{Error, Result};
use core::ptr;

// Targets without a supported mapping or CSPRNG interface. Allocation
// reports out-of-memory and randomness reports unsupported.

pub unsafe fn map_anonymous(_size: usize) -> *mut u8 {
    ptr::null_mut()
}

pub unsafe fn unmap(_ptr: *mut u8, _size: usize) {}

pub fn query_page_size() -> usize {
    4096
}

pub fn fill_random(_buf: &mut [u8]) -> Result<()> {
    Err(Error::Unsupported)
}

#[inline]
pub fn set_errno(_value: libc::c_int) {}
