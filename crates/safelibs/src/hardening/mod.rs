pub mod canary;
pub mod poison;

/// Abort with a diagnostic message to stderr.
/// Used for precondition violations with no sensible recovery, and for
/// corruption when fail-fast is configured.
#[cold]
#[inline(never)]
pub fn abort_with_message(msg: &str) -> ! {
    unsafe {
        // Write directly to stderr fd (2) -- no allocation needed
        libc::write(2, msg.as_ptr() as *const libc::c_void, msg.len());
        libc::abort();
    }
}
