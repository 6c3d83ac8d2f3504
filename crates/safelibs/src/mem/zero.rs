use core::ptr;
use core::sync::atomic::{compiler_fence, Ordering};

/// Write `value` into `len` bytes starting at `dst`.
///
/// Stores are volatile and followed by a compiler fence, so they survive
/// dead-store elimination even when `dst` is freed or unmapped right after.
/// Word-sized stores are used for the aligned middle of large buffers.
///
/// # Safety
/// `dst` must be valid for writes of `len` bytes.
#[inline(never)]
pub unsafe fn fill_raw(dst: *mut u8, value: u8, len: usize) {
    const WORD: usize = core::mem::size_of::<usize>();

    let mut i = 0usize;
    let head = dst.align_offset(WORD).min(len);
    while i < head {
        ptr::write_volatile(dst.add(i), value);
        i += 1;
    }

    let pattern = usize::from_ne_bytes([value; WORD]);
    while i + WORD <= len {
        ptr::write_volatile(dst.add(i) as *mut usize, pattern);
        i += WORD;
    }

    while i < len {
        ptr::write_volatile(dst.add(i), value);
        i += 1;
    }

    compiler_fence(Ordering::SeqCst);
}

/// Zero `len` bytes at `dst`; see [`fill_raw`].
///
/// # Safety
/// `dst` must be valid for writes of `len` bytes.
#[inline]
pub unsafe fn zero_raw(dst: *mut u8, len: usize) {
    fill_raw(dst, 0, len);
}

/// Fill every byte of `buf` with `value`.
pub fn fill(buf: &mut [u8], value: u8) {
    unsafe { fill_raw(buf.as_mut_ptr(), value, buf.len()) }
}

/// Zero every byte of `buf`.
pub fn zero(buf: &mut [u8]) {
    fill(buf, 0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_clears_every_byte() {
        for len in [0usize, 1, 7, 8, 9, 31, 256, 1000] {
            let mut buf = vec![0x5Au8; len];
            zero(&mut buf);
            assert!(buf.iter().all(|&b| b == 0), "len {}", len);
        }
    }

    #[test]
    fn fill_handles_unaligned_heads_and_tails() {
        let mut backing = [0u8; 64];
        for start in 0..9 {
            for len in 0..40 {
                backing.iter_mut().for_each(|b| *b = 0);
                fill(&mut backing[start..start + len], 0xC3);
                for (i, &b) in backing.iter().enumerate() {
                    let inside = i >= start && i < start + len;
                    assert_eq!(b == 0xC3, inside, "start {} len {} index {}", start, len, i);
                }
            }
        }
    }
}
