//! Bounded C-string copy, concatenation and search.
//!
//! Slice forms treat a source as a C string that ends at its first NUL or at
//! the end of the slice, whichever comes first. The effective bound is
//! `min(bound, dst.len())`, so the slice forms can never write out of range.
//! Truncation is silent.

use crate::mem;
use core::ptr;
use libc::c_char;

/// Length of the C string held in `s` (bytes before the first NUL).
#[inline]
pub fn c_len(s: &[u8]) -> usize {
    s.iter().position(|&b| b == 0).unwrap_or(s.len())
}

/// Copy at most `bound - 1` bytes of `src` into `dst` and NUL-terminate.
///
/// Returns the number of data bytes copied, or `None` (no write) when the
/// effective bound is zero.
pub fn copy(dst: &mut [u8], src: &[u8], bound: usize) -> Option<usize> {
    let bound = bound.min(dst.len());
    if bound == 0 {
        return None;
    }
    let n = c_len(src).min(bound - 1);
    dst[..n].copy_from_slice(&src[..n]);
    dst[n] = 0;
    Some(n)
}

/// Append `src` to the C string in `dst`, never touching bytes at or past
/// `bound`.
///
/// Returns the resulting string length. When `dst` has no terminator within
/// the bound there is no room to append and nothing is written (`None`).
pub fn concat(dst: &mut [u8], src: &[u8], bound: usize) -> Option<usize> {
    let bound = bound.min(dst.len());
    let existing = dst[..bound].iter().position(|&b| b == 0)?;
    let appended = copy(&mut dst[existing..bound], src, bound - existing)?;
    Some(existing + appended)
}

/// Offset of the first occurrence of C string `needle` in C string `haystack`.
pub fn find_str(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    mem::find(&haystack[..c_len(haystack)], &needle[..c_len(needle)])
}

/// `strnlen`: length of the C string at `s`, reading at most `max` bytes.
///
/// # Safety
/// `s` must be readable up to its terminator or `max` bytes, whichever is first.
pub unsafe fn strnlen_raw(s: *const c_char, max: usize) -> usize {
    let mut n = 0;
    while n < max && *s.add(n) != 0 {
        n += 1;
    }
    n
}

/// Raw form of [`copy`]. Returns `dst`, or null when either pointer is null
/// or `bound` is zero.
///
/// # Safety
/// `dst` must be writable for `bound` bytes; `src` readable up to its
/// terminator or `bound - 1` bytes.
pub unsafe fn copy_raw(dst: *mut c_char, src: *const c_char, bound: usize) -> *mut c_char {
    if dst.is_null() || src.is_null() || bound == 0 {
        return ptr::null_mut();
    }
    let n = strnlen_raw(src, bound - 1);
    ptr::copy(src, dst, n);
    *dst.add(n) = 0;
    dst
}

/// Raw form of [`concat`]. Returns `dst` (null if either pointer is null).
///
/// # Safety
/// `dst` must be readable and writable for `bound` bytes; `src` readable up
/// to its terminator or the remaining bound.
pub unsafe fn concat_raw(dst: *mut c_char, src: *const c_char, bound: usize) -> *mut c_char {
    if dst.is_null() || src.is_null() {
        return ptr::null_mut();
    }
    let existing = strnlen_raw(dst, bound);
    if existing < bound {
        copy_raw(dst.add(existing), src, bound - existing);
    }
    dst
}

/// `strstr` built on [`mem::find_raw`]. Returns a pointer into `haystack`
/// or null.
///
/// # Safety
/// Both arguments must be NUL-terminated strings.
pub unsafe fn find_str_raw(haystack: *const c_char, needle: *const c_char) -> *const c_char {
    if haystack.is_null() || needle.is_null() {
        return ptr::null();
    }
    mem::find_raw(
        haystack as *const u8,
        libc::strlen(haystack),
        needle as *const u8,
        libc::strlen(needle),
    ) as *const c_char
}
