use crate::mem;
use crate::util::CLOBBER_BYTE;

/// Fill a memory region with the clobber byte.
///
/// # Safety
/// `ptr` must point to a valid writable region of at least `size` bytes.
#[inline]
pub unsafe fn poison_region(ptr: *mut u8, size: usize) {
    mem::fill_raw(ptr, CLOBBER_BYTE, size);
}

/// Check that a memory region still contains only clobber bytes.
///
/// # Safety
/// `ptr` must point to a valid readable region of at least `size` bytes.
pub unsafe fn check_poison(ptr: *const u8, size: usize) -> bool {
    // Word at a time, then the tail.
    let ptr64 = ptr as *const u64;
    let expected = u64::from_le_bytes([CLOBBER_BYTE; 8]);
    let full_words = size / 8;
    let remainder = size % 8;

    for i in 0..full_words {
        if ptr64.add(i).read_unaligned() != expected {
            return false;
        }
    }

    let tail = ptr.add(full_words * 8);
    for i in 0..remainder {
        if tail.add(i).read() != CLOBBER_BYTE {
            return false;
        }
    }

    true
}
