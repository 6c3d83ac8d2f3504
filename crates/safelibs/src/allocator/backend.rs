use crate::error::Result;
use core::ptr::NonNull;

/// Where allocations come from.
///
/// The mapped backend gives every allocation its own mapping with an inline
/// canary header; the system backend hands out `posix_memalign` memory with
/// no metadata of its own.
pub trait Backend: Sync {
    /// Obtain `length` bytes aligned to `alignment` (0 means the default).
    fn allocate(&self, alignment: usize, length: usize) -> Result<NonNull<u8>>;

    /// Give a block back. An `Err` reports what was wrong with the block;
    /// the memory is released either way.
    ///
    /// # Safety
    /// `ptr` must come from `allocate` on this backend and not be released yet.
    unsafe fn release(&self, ptr: NonNull<u8>) -> Result<()>;

    /// The length originally requested for `ptr`, when the backend records it
    /// and the record is intact.
    ///
    /// # Safety
    /// Same as `release`.
    unsafe fn requested_len(&self, ptr: NonNull<u8>) -> Option<usize>;
}
