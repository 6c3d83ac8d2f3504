use super::compare::compare_raw;
use core::ptr;

/// Find the first occurrence of `needle` in `haystack`, returning its offset.
///
/// Candidates are pre-filtered on the first byte and confirmed with the
/// constant-time comparator. The scan as a whole is not constant time; each
/// confirmation is.
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if haystack.len() < needle.len() {
        return None;
    }
    if needle.len() == 1 {
        return haystack.iter().position(|&b| b == needle[0]);
    }

    let first = needle[0];
    let last_start = haystack.len() - needle.len();
    (0..=last_start).find(|&pos| {
        haystack[pos] == first
            && unsafe { compare_raw(haystack.as_ptr().add(pos), needle.as_ptr(), needle.len()) } == 0
    })
}

/// Raw-pointer form of [`find`] returning a pointer into the haystack or null.
///
/// # Safety
/// `haystack` must be valid for reads of `haystack_len` bytes and `needle`
/// for `needle_len` bytes (either may be dangling when its length is 0).
pub unsafe fn find_raw(
    haystack: *const u8,
    haystack_len: usize,
    needle: *const u8,
    needle_len: usize,
) -> *const u8 {
    if needle_len == 0 {
        return haystack;
    }
    if haystack.is_null() || needle.is_null() || haystack_len < needle_len {
        return ptr::null();
    }
    let h = core::slice::from_raw_parts(haystack, haystack_len);
    let n = core::slice::from_raw_parts(needle, needle_len);
    match find(h, n) {
        Some(offset) => haystack.add(offset),
        None => ptr::null(),
    }
}
