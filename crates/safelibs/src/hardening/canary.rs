use crate::random;
use crate::util::CANARY_MAGIC;
use core::sync::atomic::{AtomicU64, Ordering};

/// Per-process secret mixed into every canary. Set once during init.
static SECRET: AtomicU64 = AtomicU64::new(0);

/// Draw the canary secret from the CSPRNG.
///
/// Falls back to the bare magic value when no CSPRNG is available, which
/// still catches accidental overwrites but not a forging attacker.
pub fn init_secret() {
    let secret = match random::random_u64() {
        Ok(v) => v,
        Err(e) => {
            log::warn!("safelibs: no CSPRNG for canary secret ({}); using fixed canary", e);
            0
        }
    };
    SECRET.store(secret, Ordering::Release);
}

#[inline(always)]
pub fn secret() -> u64 {
    SECRET.load(Ordering::Relaxed)
}

/// Domain separation between the address and length halves of the canary.
const LENGTH_KEY: u64 = 0x9E37_79B9_7F4A_7C15;

/// splitmix64 finalizer. A bijection on `u64`.
#[inline(always)]
fn mix(mut x: u64) -> u64 {
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

/// Canary for a header at `header_addr` recording `length` payload bytes.
///
/// For a fixed address the canary is a bijection of the length, so any edit
/// of the stored length without the secret fails the check. Binding the
/// address stops a header copied from one block from validating in another.
#[inline]
pub fn canary_for(header_addr: usize, length: usize) -> u64 {
    let secret = secret();
    mix((header_addr as u64) ^ secret ^ CANARY_MAGIC)
        ^ mix((length as u64) ^ secret.rotate_left(29) ^ LENGTH_KEY)
}

/// Check a canary read back from the header at `header_addr`.
#[inline]
pub fn check_canary(header_addr: usize, length: usize, stored: u64) -> bool {
    crate::mem::compare(
        &stored.to_ne_bytes(),
        &canary_for(header_addr, length).to_ne_bytes(),
    ) == 0
}
