use core::sync::atomic::{AtomicBool, Ordering};

/// Cached config values (read once at init, never allocate).
static DISABLED: AtomicBool = AtomicBool::new(false);
static ABORT_ON_CORRUPTION: AtomicBool = AtomicBool::new(false);

/// Read configuration from environment variables.
/// Must be called during init, before any allocations.
///
/// # Safety
/// Calls libc::getenv, which races with concurrent setenv.
pub unsafe fn read_config() {
    DISABLED.store(getenv_flag(b"SAFELIBS_DISABLE\0"), Ordering::Relaxed);
    ABORT_ON_CORRUPTION.store(
        getenv_flag(b"SAFELIBS_ABORT_ON_CORRUPTION\0"),
        Ordering::Relaxed,
    );
}

/// Route allocations to the system allocator instead of raw mappings.
pub fn is_disabled() -> bool {
    DISABLED.load(Ordering::Relaxed)
}

/// Abort when `free` finds a damaged header instead of reporting it.
pub fn abort_on_corruption() -> bool {
    ABORT_ON_CORRUPTION.load(Ordering::Relaxed)
}

/// A flag is set when the variable exists and is not "0" or empty.
///
/// # Safety
/// Calls libc::getenv. `key` must be NUL-terminated.
unsafe fn getenv_flag(key: &[u8]) -> bool {
    let val = libc::getenv(key.as_ptr() as *const libc::c_char);
    if val.is_null() {
        return false;
    }
    let first = *(val as *const u8);
    !(first == 0 || (first == b'0' && *(val as *const u8).add(1) == 0))
}
