//! Hardening verification tests for the canary allocator.
//!
//! Corruption is reported (not fatal) by default. The fail-fast mode is
//! driven through a subprocess: the test binary re-runs itself with
//! `SAFELIBS_HARDENING_SCENARIO` set and the configuration variable under
//! test in its environment, since configuration is read once at load time.

use libc::c_void;
use safelibs::allocator::{self, HEADER_SIZE};
use safelibs::error::Error;
use safelibs::hardening::poison;
use safelibs::init;
use safelibs::util::CLOBBER_BYTE;
use std::ptr;

/// True when the mapped backend is active (the default configuration).
fn mapped_active() -> bool {
    init::ensure_initialized();
    init::state() == init::STATE_READY
}

fn errno() -> i32 {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Canary
// ---------------------------------------------------------------------------

#[test]
fn intact_block_frees_cleanly() {
    if !mapped_active() {
        return;
    }
    let p = allocator::malloc(256).unwrap();
    unsafe {
        ptr::write_bytes(p.as_ptr(), 0x42, 256);
        assert_eq!(allocator::requested_size(p), Some(256));
        allocator::free(p.as_ptr()).unwrap();
    }
}

#[test]
fn byte_before_payload_is_detected() {
    if !mapped_active() {
        return;
    }
    let p = allocator::malloc(64).unwrap();
    let addr = p.as_ptr() as usize;
    unsafe {
        *p.as_ptr().sub(1) ^= 0xFF;
        match allocator::free(p.as_ptr()) {
            Err(Error::Corruption { addr: reported }) => assert_eq!(reported, addr),
            other => panic!("expected corruption, got {:?}", other),
        }
    }
}

#[test]
fn every_canary_byte_is_covered() {
    if !mapped_active() {
        return;
    }
    for offset in 1..=8 {
        let p = allocator::malloc(32).unwrap();
        unsafe {
            *p.as_ptr().sub(offset) = (*p.as_ptr().sub(offset)).wrapping_add(1);
            assert!(
                matches!(allocator::free(p.as_ptr()), Err(Error::Corruption { .. })),
                "flip at payload-{} not detected",
                offset
            );
        }
    }
}

#[test]
fn damaged_length_is_contained() {
    if !mapped_active() {
        return;
    }
    let p = allocator::malloc(64).unwrap();
    unsafe {
        // Overwrite the whole header, length included.
        ptr::write_bytes(p.as_ptr().sub(HEADER_SIZE), 0xFF, HEADER_SIZE);
        assert_eq!(allocator::requested_size(p), None);
        assert!(matches!(
            allocator::free(p.as_ptr()),
            Err(Error::Corruption { .. })
        ));
    }
}

fn is_mapped(page: usize) -> bool {
    let mut residency = [0u8; 1];
    let ps = safelibs::util::page_size();
    unsafe { libc::mincore(page as *mut c_void, ps, residency.as_mut_ptr() as _) == 0 }
}

#[test]
fn forged_length_cannot_reach_neighbour() {
    if !mapped_active() {
        return;
    }
    let ps = safelibs::util::page_size();
    let base_of = |p: *mut u8| (p as usize - HEADER_SIZE) & !(ps - 1);

    let blocks: Vec<*mut u8> = (0..64)
        .map(|_| allocator::malloc(64).unwrap().as_ptr())
        .collect();
    let pair = blocks.iter().find_map(|&lo| {
        blocks
            .iter()
            .find(|&&hi| base_of(hi) == base_of(lo) + ps)
            .map(|&hi| (lo, hi))
    });

    if let Some((lo, hi)) = pair {
        unsafe {
            // Rewrite only the length word; the canary is left as written.
            (lo.sub(HEADER_SIZE) as *mut usize).write_unaligned(ps + 64);
            assert!(matches!(
                allocator::free(lo),
                Err(Error::Corruption { .. })
            ));
            assert!(is_mapped(base_of(hi)), "neighbouring block was unmapped");
            ptr::write_bytes(hi, 0x3C, 64);
        }
    }

    for p in blocks {
        if pair.map_or(false, |(lo, _)| lo == p) {
            continue;
        }
        unsafe { allocator::free(p).unwrap() };
    }
}

#[test]
fn c_free_sets_errno_on_corruption() {
    if !mapped_active() {
        return;
    }
    unsafe {
        let p = safelibs::api::safe_malloc(40) as *mut u8;
        assert!(!p.is_null());
        *p.sub(1) ^= 0x01;
        safelibs::api::safe_free(p as *mut c_void);
        assert_eq!(errno(), libc::EINVAL);
    }
}

#[test]
fn realloc_reports_damaged_old_block() {
    if !mapped_active() {
        return;
    }
    unsafe {
        let p = allocator::malloc(16).unwrap();
        *p.as_ptr().sub(2) ^= 0x80;
        let r = allocator::realloc(p.as_ptr(), 32).unwrap();
        assert!(matches!(r.released, Err(Error::Corruption { .. })));
        allocator::free(r.ptr.as_ptr()).unwrap();
    }
}

#[test]
fn canary_is_address_bound() {
    if !mapped_active() {
        return;
    }
    let a = allocator::malloc(8).unwrap();
    let b = allocator::malloc(8).unwrap();
    unsafe {
        let ca = a.as_ptr().sub(8).cast::<u64>().read_unaligned();
        let cb = b.as_ptr().sub(8).cast::<u64>().read_unaligned();
        assert_ne!(ca, cb);
        allocator::free(a.as_ptr()).unwrap();
        allocator::free(b.as_ptr()).unwrap();
    }
}

// ---------------------------------------------------------------------------
// Poisoning
// ---------------------------------------------------------------------------

#[test]
fn fresh_malloc_is_poisoned() {
    let p = allocator::malloc(100).unwrap();
    unsafe {
        assert!(poison::check_poison(p.as_ptr(), 100));
        *p.as_ptr().add(99) = 0;
        assert!(!poison::check_poison(p.as_ptr(), 100));
        allocator::free(p.as_ptr()).unwrap();
    }
}

#[test]
fn alloc_is_not_poisoned() {
    if !mapped_active() {
        return;
    }
    // The aligned entry point hands out the kernel's zero pages untouched.
    let p = allocator::alloc(64, 128).unwrap();
    unsafe {
        let s = std::slice::from_raw_parts(p.as_ptr(), 128);
        assert!(s.iter().all(|&b| b == 0));
        assert_ne!(s[0], CLOBBER_BYTE);
        allocator::free(p.as_ptr()).unwrap();
    }
}

// ---------------------------------------------------------------------------
// Subprocess scenarios
// ---------------------------------------------------------------------------

fn run_scenario(scenario: &str, extra_env: &[(&str, &str)]) -> std::process::Output {
    let exe = std::env::current_exe().expect("cannot determine test binary path");
    let mut cmd = std::process::Command::new(&exe);
    cmd.env("SAFELIBS_HARDENING_SCENARIO", scenario)
        .env_remove("SAFELIBS_DISABLE")
        .env_remove("SAFELIBS_ABORT_ON_CORRUPTION")
        .arg("--exact")
        .arg("scenario_driver")
        .arg("--nocapture")
        .env("RUST_TEST_THREADS", "1");
    for (k, v) in extra_env {
        cmd.env(k, v);
    }
    cmd.output().expect("failed to spawn subprocess")
}

#[test]
fn scenario_driver() {
    let scenario = match std::env::var("SAFELIBS_HARDENING_SCENARIO") {
        Ok(s) => s,
        Err(_) => return,
    };

    match scenario.as_str() {
        "canary_corruption" => scenario_canary_corruption(),
        "disabled" => scenario_disabled(),
        _ => panic!("unknown scenario: {}", scenario),
    }
}

fn scenario_canary_corruption() {
    unsafe {
        let p = allocator::malloc(64).unwrap();
        *p.as_ptr().sub(1) ^= 0xFF;
        let _ = allocator::free(p.as_ptr());
    }
    unreachable!("corruption did not abort");
}

fn scenario_disabled() {
    assert_eq!(init::state(), init::STATE_DISABLED);
    let p = allocator::malloc(64).unwrap();
    unsafe {
        assert!(poison::check_poison(p.as_ptr(), 64));
        assert_eq!(allocator::requested_size(p), None);
        allocator::free(p.as_ptr()).unwrap();
    }
}

#[test]
fn abort_on_corruption_kills_process() {
    let out = run_scenario(
        "canary_corruption",
        &[("SAFELIBS_ABORT_ON_CORRUPTION", "1")],
    );
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(!out.status.success(), "child survived. stderr:\n{}", stderr);
    assert!(
        stderr.contains("heap corruption detected"),
        "missing diagnostic. stderr:\n{}",
        stderr
    );
}

#[test]
fn abort_flag_zero_means_off() {
    let out = run_scenario(
        "canary_corruption",
        &[("SAFELIBS_ABORT_ON_CORRUPTION", "0")],
    );
    // No abort: the scenario falls through to its `unreachable!` panic.
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(!out.status.success());
    assert!(!stderr.contains("heap corruption detected"), "{}", stderr);
}

#[test]
fn disable_switches_to_system_backend() {
    let out = run_scenario("disabled", &[("SAFELIBS_DISABLE", "1")]);
    assert!(
        out.status.success(),
        "stderr:\n{}",
        String::from_utf8_lossy(&out.stderr)
    );
}
