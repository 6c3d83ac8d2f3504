#![no_main]

use libfuzzer_sys::fuzz_target;
use safelibs::{mem, string};

/// Fuzz target for the bounded string and search routines.
///
/// Input layout:
///   byte 0: bound for copy/concat
///   byte 1: split point between the two strings
///   rest:   source bytes (NULs allowed; they end the C string early)
///
/// Nothing may be written at or past the bound, and the result inside the
/// bound must stay NUL-terminated.
const DST_LEN: usize = 64;
const GUARD: u8 = 0xE7;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let bound = data[0] as usize % (DST_LEN + 8);
    let rest = &data[2..];
    let split = (data[1] as usize).min(rest.len());
    let (first, second) = rest.split_at(split);

    let mut dst = [GUARD; DST_LEN];
    let limit = bound.min(DST_LEN);

    match string::copy(&mut dst, first, bound) {
        None => assert_eq!(limit, 0),
        Some(n) => {
            assert!(n < limit);
            assert_eq!(dst[n], 0);
            assert_eq!(&dst[..n], &first[..n]);
        }
    }
    assert!(dst[limit..].iter().all(|&b| b == GUARD));

    let before = string::c_len(&dst[..limit]);
    if let Some(total) = string::concat(&mut dst, second, bound) {
        assert!(total < limit);
        assert!(total >= before);
        assert_eq!(dst[total], 0);
    }
    assert!(dst[limit..].iter().all(|&b| b == GUARD));

    // Any reported match must compare equal.
    if let Some(pos) = mem::find(first, second) {
        assert!(pos + second.len() <= first.len());
        assert_eq!(mem::compare(&first[pos..pos + second.len()], second), 0);
    } else if !second.is_empty() && second.len() <= first.len() {
        assert!(!first.windows(second.len()).any(|w| w == second));
    }
});
