//! CSPRNG-backed randomness.
//!
//! No state lives here; every call goes to the kernel (`getrandom`) or the
//! libc CSPRNG (`arc4random_buf`).

use crate::error::Result;
use crate::{mem, platform};

/// Zero `buf`, then fill it with cryptographically strong random bytes.
///
/// Zeroing first means a failure path never leaves stale caller data in
/// a buffer that is about to be treated as key material.
pub fn fill(buf: &mut [u8]) -> Result<()> {
    mem::zero(buf);
    platform::fill_random(buf)
}

/// A random machine word.
pub fn random_usize() -> Result<usize> {
    let mut bytes = [0u8; core::mem::size_of::<usize>()];
    fill(&mut bytes)?;
    Ok(usize::from_ne_bytes(bytes))
}

/// A random `int`-sized value.
pub fn random_i32() -> Result<i32> {
    let mut bytes = [0u8; core::mem::size_of::<i32>()];
    fill(&mut bytes)?;
    Ok(i32::from_ne_bytes(bytes))
}

/// A random 64-bit value.
pub fn random_u64() -> Result<u64> {
    let mut bytes = [0u8; 8];
    fill(&mut bytes)?;
    Ok(u64::from_ne_bytes(bytes))
}

#[cfg(all(test, any(target_os = "linux", target_os = "macos", target_os = "freebsd")))]
mod tests {
    use super::*;

    #[test]
    fn fill_empty_is_ok() {
        fill(&mut []).unwrap();
    }

    #[test]
    fn fill_produces_nonconstant_output() {
        let mut a = [0u8; 64];
        let mut b = [0u8; 64];
        fill(&mut a).unwrap();
        fill(&mut b).unwrap();
        // 2^-512 chance of a false failure.
        assert_ne!(a, b);
        assert!(a.iter().any(|&x| x != 0));
    }

    #[test]
    fn word_helpers_vary() {
        let words: Vec<usize> = (0..8).map(|_| random_usize().unwrap()).collect();
        assert!(words.windows(2).any(|w| w[0] != w[1]));
        let ints: Vec<i32> = (0..8).map(|_| random_i32().unwrap()).collect();
        assert!(ints.windows(2).any(|w| w[0] != w[1]));
    }
}
