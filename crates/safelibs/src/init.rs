use crate::allocator::{CanaryAllocator, MappedBackend, SystemBackend};
use crate::hardening::canary;
use crate::{config, util};
use core::sync::atomic::{AtomicU8, Ordering};

const UNINIT: u8 = 0;
const INITIALIZING: u8 = 1;
const READY: u8 = 2;
const DISABLED: u8 = 3;

pub static INIT_STATE: AtomicU8 = AtomicU8::new(UNINIT);

static MAPPED: CanaryAllocator<MappedBackend> = CanaryAllocator::new(MappedBackend);
static SYSTEM: CanaryAllocator<SystemBackend> = CanaryAllocator::new(SystemBackend);

/// Library constructor -- called before main().
#[used]
#[cfg_attr(any(target_os = "linux", target_os = "android", target_os = "freebsd"), link_section = ".init_array")]
#[cfg_attr(target_os = "macos", link_section = "__DATA,__mod_init_func")]
static CTOR: unsafe extern "C" fn() = {
    unsafe extern "C" fn init() {
        safelibs_init();
    }
    init
};

/// One-time setup: page size, configuration, canary secret.
///
/// # Safety
/// Reads the environment with `getenv`; must not race with `setenv`.
pub unsafe fn safelibs_init() {
    match INIT_STATE.compare_exchange(UNINIT, INITIALIZING, Ordering::AcqRel, Ordering::Acquire) {
        Ok(_) => {}
        Err(INITIALIZING) => {
            while INIT_STATE.load(Ordering::Acquire) == INITIALIZING {
                core::hint::spin_loop();
            }
            return;
        }
        Err(_) => return,
    }

    util::init_page_size();
    config::read_config();
    canary::init_secret();

    // Kill-switch: serve every allocation from the system allocator.
    if config::is_disabled() {
        log::debug!("safelibs: SAFELIBS_DISABLE set, using the system allocator");
        INIT_STATE.store(DISABLED, Ordering::Release);
        return;
    }

    INIT_STATE.store(READY, Ordering::Release);
}

#[cold]
#[inline(never)]
pub fn ensure_initialized() {
    unsafe { safelibs_init() };
}

#[inline(always)]
pub fn state() -> u8 {
    INIT_STATE.load(Ordering::Acquire)
}

/// The canary allocator backed by raw mappings.
#[inline(always)]
pub fn mapped() -> &'static CanaryAllocator<MappedBackend> {
    &MAPPED
}

/// The passthrough allocator backed by the system `posix_memalign`/`free`.
#[inline(always)]
pub fn system() -> &'static CanaryAllocator<SystemBackend> {
    &SYSTEM
}

pub const STATE_READY: u8 = READY;
pub const STATE_DISABLED: u8 = DISABLED;
