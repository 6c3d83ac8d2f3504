/// Align `value` up to the next multiple of `align`.
/// `align` must be a power of two. Returns `None` on overflow.
#[inline(always)]
pub const fn checked_align_up(value: usize, align: usize) -> Option<usize> {
    debug_assert!(align.is_power_of_two());
    match value.checked_add(align - 1) {
        Some(v) => Some(v & !(align - 1)),
        None => None,
    }
}

/// Align `value` up to the next multiple of `align`.
/// `align` must be a power of two and the result must not overflow.
#[inline(always)]
pub const fn align_up(value: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (value + align - 1) & !(align - 1)
}

/// Align `value` down to the previous multiple of `align`.
/// `align` must be a power of two.
#[inline(always)]
pub const fn align_down(value: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    value & !(align - 1)
}

/// Check if `value` is aligned to `align`.
#[inline(always)]
pub const fn is_aligned(value: usize, align: usize) -> bool {
    value & (align - 1) == 0
}

/// Minimum alignment for all allocations (matches max_align_t on 64-bit).
pub const MIN_ALIGN: usize = 16;

/// Runtime page size, initialized from sysconf(_SC_PAGESIZE) at startup.
/// Starts at 4096 so `page_size()` is usable before init.
static PAGE_SIZE_CACHED: core::sync::atomic::AtomicUsize =
    core::sync::atomic::AtomicUsize::new(4096);

/// Initialize the page size from the OS. Must be called once during init.
pub fn init_page_size() {
    let ps = crate::platform::query_page_size();
    let ps = if ps.is_power_of_two() { ps } else { 4096 };
    PAGE_SIZE_CACHED.store(ps, core::sync::atomic::Ordering::Release);
}

/// Get the system page size: the allocation granularity of the mapped backend.
#[inline(always)]
pub fn page_size() -> usize {
    PAGE_SIZE_CACHED.load(core::sync::atomic::Ordering::Relaxed)
}

/// Byte written over fresh `malloc` payloads and over freed payloads
/// (low byte of 0xdead).
pub const CLOBBER_BYTE: u8 = 0xAD;

/// Fixed sentinel mixed into every allocation canary.
pub const CANARY_MAGIC: u64 = 0x5AFE_11B5_DEAD_C0DE;

/// Regions at least this large are classified as huge-page mappings.
pub const HUGE_PAGE_THRESHOLD: usize = 2 * 1024 * 1024; // 2 MiB

/// Capacity of a process-map snapshot table.
pub const PROC_MAP_MAX: usize = 256;

/// `pid` sentinel meaning "the calling process" in the C ABI.
pub const PID_SELF: libc::pid_t = -1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_helpers() {
        assert_eq!(align_up(1, 16), 16);
        assert_eq!(align_up(16, 16), 16);
        assert_eq!(align_down(4097, 4096), 4096);
        assert!(is_aligned(8192, 4096));
        assert!(!is_aligned(8193, 4096));
    }

    #[test]
    fn checked_align_up_overflow() {
        assert_eq!(checked_align_up(usize::MAX, 4096), None);
        assert_eq!(checked_align_up(4095, 4096), Some(4096));
        assert_eq!(checked_align_up(0, 4096), Some(0));
    }
}
