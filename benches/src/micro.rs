/// Microbenchmarks for safelibs.
///
/// Plain timing loops over the `safe_*` C surface, with the libc routine the
/// call replaces alongside for comparison. The compare section reports the
/// early-vs-late mismatch ratio, which should stay close to 1.0.

use safelibs::api::*;
use std::hint::black_box;
use std::time::Instant;

fn ns_per_op(iterations: usize, mut f: impl FnMut()) -> f64 {
    for _ in 0..iterations.min(1000) {
        f();
    }
    let start = Instant::now();
    for _ in 0..iterations {
        f();
    }
    start.elapsed().as_nanos() as f64 / iterations as f64
}

/// Compare `len`-byte buffers differing only at `mismatch_at`.
fn bench_bcmp(len: usize, mismatch_at: usize, iterations: usize) -> (f64, f64) {
    let a = vec![0x5Au8; len];
    let mut b = a.clone();
    b[mismatch_at] ^= 1;

    let safe = ns_per_op(iterations, || unsafe {
        black_box(safe_bcmp(
            black_box(a.as_ptr()) as _,
            black_box(b.as_ptr()) as _,
            len,
        ));
    });
    let libc = ns_per_op(iterations, || unsafe {
        black_box(libc::memcmp(
            black_box(a.as_ptr()) as _,
            black_box(b.as_ptr()) as _,
            len,
        ));
    });
    (safe, libc)
}

fn bench_bzero(len: usize, iterations: usize) -> f64 {
    let mut buf = vec![0xFFu8; len];
    ns_per_op(iterations, || unsafe {
        safe_bzero(black_box(buf.as_mut_ptr()) as _, len);
    })
}

fn bench_memmem(haystack_len: usize, iterations: usize) -> f64 {
    let mut haystack = vec![b'a'; haystack_len];
    let needle = b"aab";
    let tail = haystack_len - needle.len();
    haystack[tail..].copy_from_slice(needle);
    ns_per_op(iterations, || unsafe {
        black_box(safe_memmem(
            black_box(haystack.as_ptr()) as _,
            haystack_len,
            needle.as_ptr() as _,
            needle.len(),
        ));
    })
}

fn bench_malloc_free(size: usize, iterations: usize) -> f64 {
    ns_per_op(iterations, || unsafe {
        let ptr = safe_malloc(black_box(size)) as *mut u8;
        std::ptr::write_bytes(ptr, 0xAB, std::cmp::min(size, 64));
        safe_free(black_box(ptr) as _);
    })
}

fn bench_calloc_free(size: usize, iterations: usize) -> f64 {
    ns_per_op(iterations, || unsafe {
        let ptr = safe_calloc(black_box(1), black_box(size));
        safe_free(black_box(ptr));
    })
}

fn bench_realloc_grow(iterations: usize) -> f64 {
    ns_per_op(iterations, || unsafe {
        let mut ptr = safe_malloc(black_box(16));
        for &size in black_box(&[32usize, 64, 128, 256, 512, 1024]) {
            ptr = safe_realloc(black_box(ptr), size);
        }
        safe_free(black_box(ptr));
    })
}

fn bench_getrandom(len: usize, iterations: usize) -> f64 {
    let mut buf = vec![0u8; len];
    ns_per_op(iterations, || unsafe {
        black_box(safe_getrandom(buf.as_mut_ptr() as _, len));
    })
}

fn bench_threaded_throughput(num_threads: usize, ops_per_thread: usize, size: usize) -> f64 {
    let start = Instant::now();
    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            std::thread::spawn(move || {
                for _ in 0..ops_per_thread {
                    unsafe {
                        let ptr = safe_malloc(black_box(size)) as *mut u8;
                        std::ptr::write_bytes(ptr, 0xCD, std::cmp::min(size, 16));
                        safe_free(black_box(ptr) as _);
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
    let total_ops = num_threads * ops_per_thread;
    total_ops as f64 / start.elapsed().as_secs_f64()
}

fn main() {
    let iterations: usize = std::env::var("SAFELIBS_BENCH_ITERS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(200_000);

    println!("=== safelibs microbenchmarks ({} iterations) ===\n", iterations);

    let mut ratios: Vec<(usize, f64)> = Vec::new();

    println!("--- bcmp: early vs late mismatch (ns/op) ---");
    for &len in &[16usize, 64, 256, 4096] {
        let (early, early_libc) = bench_bcmp(len, 0, iterations);
        let (late, late_libc) = bench_bcmp(len, len - 1, iterations);
        let ratio = late / early;
        println!(
            "  len={:>5}: safe {:>7.1} / {:>7.1} (ratio {:.2})   libc {:>7.1} / {:>7.1}",
            len, early, late, ratio, early_libc, late_libc
        );
        ratios.push((len, ratio));
    }

    println!("\n--- bzero (ns/op) ---");
    for &len in &[16usize, 256, 4096] {
        println!("  len={:>5}: {:>8.1} ns", len, bench_bzero(len, iterations));
    }

    println!("\n--- memmem, needle at end (ns/op) ---");
    for &len in &[64usize, 1024, 16384] {
        println!("  len={:>5}: {:>8.1} ns", len, bench_memmem(len, iterations / 10));
    }

    println!("\n--- getrandom (ns/op) ---");
    for &len in &[8usize, 32, 256] {
        println!("  len={:>5}: {:>8.1} ns", len, bench_getrandom(len, iterations / 10));
    }

    // Every allocation is a fresh mapping; expect syscall-bound numbers.
    let mut latencies: Vec<(usize, f64)> = Vec::new();
    println!("\n--- malloc/free latency (ns/op) ---");
    for &size in &[16usize, 256, 4096, 65536] {
        let ns = bench_malloc_free(size, iterations / 10);
        println!("  size={:>8}: {:>8.1} ns", size, ns);
        latencies.push((size, ns));
    }

    println!("\n--- calloc/free latency (ns/op) ---");
    for &size in &[64usize, 4096] {
        println!("  size={:>8}: {:>8.1} ns", size, bench_calloc_free(size, iterations / 10));
    }

    println!("\n--- realloc grow pattern (ns/op) ---");
    println!("  16->1024: {:.1} ns", bench_realloc_grow(iterations / 100));

    println!("\n--- multi-threaded throughput (Kops/sec) ---");
    for &threads in &[1usize, 4] {
        let ops_sec = bench_threaded_throughput(threads, iterations / 10 / threads, 64);
        println!("  threads={}: {:>8.1} Kops/sec", threads, ops_sec / 1000.0);
    }

    print!("\nSUMMARY");
    for &(len, ratio) in &ratios {
        print!("|bcmp_ratio_{}={:.2}", len, ratio);
    }
    for &(size, ns) in &latencies {
        print!("|malloc_{}={:.1}", size, ns);
    }
    println!();
}
