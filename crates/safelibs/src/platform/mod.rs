#[cfg(any(target_os = "linux", target_os = "android"))]
pub mod linux;
#[cfg(any(target_os = "linux", target_os = "android"))]
pub use linux as sys;

#[cfg(target_os = "macos")]
pub mod macos;
#[cfg(target_os = "macos")]
pub use macos as sys;

#[cfg(target_os = "freebsd")]
pub mod freebsd;
#[cfg(target_os = "freebsd")]
pub use freebsd as sys;

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "freebsd"
)))]
pub mod fallback;
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "freebsd"
)))]
pub use fallback as sys;

use crate::error::Result;

/// Map anonymous, zero-filled read-write memory. Returns null on failure.
///
/// # Safety
/// Caller must ensure `size` is page-aligned and non-zero.
#[inline]
pub unsafe fn map_anonymous(size: usize) -> *mut u8 {
    sys::map_anonymous(size)
}

/// Unmap previously mapped memory.
///
/// # Safety
/// `ptr` must have been returned by `map_anonymous` and `size` must match.
#[inline]
pub unsafe fn unmap(ptr: *mut u8, size: usize) {
    sys::unmap(ptr, size);
}

/// Ask the OS for its page size.
pub fn query_page_size() -> usize {
    sys::query_page_size()
}

/// Fill `buf` from the kernel CSPRNG. `buf` is not zeroed here; see
/// [`crate::random::fill`].
pub fn fill_random(buf: &mut [u8]) -> Result<()> {
    sys::fill_random(buf)
}

/// Set the calling thread's `errno`.
#[inline]
pub fn set_errno(value: libc::c_int) {
    sys::set_errno(value);
}

/// Identifier of the calling process.
#[inline]
pub fn current_pid() -> u32 {
    std::process::id()
}
