use core::ptr;

/// Compare `len` bytes at `a` and `b` without data-dependent control flow.
///
/// Returns 0 iff every byte pair is equal, otherwise the bitwise OR of all
/// XOR differences. The result is not an ordering. Every index is read,
/// whatever happened at earlier indices.
///
/// # Safety
/// `a` and `b` must both be valid for reads of `len` bytes.
#[inline(never)]
pub unsafe fn compare_raw(a: *const u8, b: *const u8, len: usize) -> u8 {
    let mut delta = 0u8;
    let mut i = 0usize;
    while i < len {
        delta |= ptr::read_volatile(a.add(i)) ^ ptr::read_volatile(b.add(i));
        i += 1;
    }
    delta
}

/// Constant-time equality over two slices.
///
/// Slices of different lengths never compare equal; the common prefix is
/// still scanned in full so timing depends only on the lengths.
pub fn compare(a: &[u8], b: &[u8]) -> u8 {
    let len = a.len().min(b.len());
    let delta = unsafe { compare_raw(a.as_ptr(), b.as_ptr(), len) };
    delta | (a.len() != b.len()) as u8
}
