//! Flat C ABI.
//!
//! These are the symbols a rewriting compiler pass redirects libc calls to.
//! Failures are reported the C way: null or -1 return plus `errno`.

use crate::error::Error;
use crate::maps::{self, RegionTable, Target};
use crate::util::{PID_SELF, PROC_MAP_MAX};
use crate::{allocator, mem, platform, random, string};
use core::cell::UnsafeCell;
use core::ffi::c_void;
use core::ptr;
use libc::{c_char, c_int, c_long, pid_t};

#[inline]
fn fail(err: &Error) {
    platform::set_errno(err.errno());
}

// ============================================================================
// Zero/fill and comparison
// ============================================================================

#[no_mangle]
pub unsafe extern "C" fn safe_bzero(p: *mut c_void, len: usize) {
    if p.is_null() {
        return;
    }
    mem::zero_raw(p as *mut u8, len);
}

#[no_mangle]
pub unsafe extern "C" fn safe_memset(p: *mut c_void, c: c_int, len: usize) -> *mut c_void {
    if !p.is_null() {
        mem::fill_raw(p as *mut u8, c as u8, len);
    }
    p
}

/// Returns 0 when equal, otherwise the OR of the byte differences.
#[no_mangle]
pub unsafe extern "C" fn safe_bcmp(a: *const c_void, b: *const c_void, len: usize) -> c_int {
    if len == 0 {
        return 0;
    }
    mem::compare_raw(a as *const u8, b as *const u8, len) as c_int
}

#[no_mangle]
pub unsafe extern "C" fn safe_memmem(
    haystack: *const c_void,
    haystack_len: usize,
    needle: *const c_void,
    needle_len: usize,
) -> *mut c_void {
    mem::find_raw(
        haystack as *const u8,
        haystack_len,
        needle as *const u8,
        needle_len,
    ) as *mut c_void
}

// ============================================================================
// Randomness
// ============================================================================

/// Returns 0 on success, -1 with `errno` set otherwise.
#[no_mangle]
pub unsafe extern "C" fn safe_getrandom(buf: *mut c_void, len: usize) -> c_int {
    if len == 0 {
        return 0;
    }
    if buf.is_null() {
        platform::set_errno(libc::EFAULT);
        return -1;
    }
    let slice = core::slice::from_raw_parts_mut(buf as *mut u8, len);
    match random::fill(slice) {
        Ok(()) => 0,
        Err(e) => {
            fail(&e);
            -1
        }
    }
}

#[no_mangle]
pub extern "C" fn safe_random() -> c_long {
    match random::random_usize() {
        Ok(v) => v as c_long,
        Err(e) => {
            fail(&e);
            0
        }
    }
}

#[no_mangle]
pub extern "C" fn safe_rand() -> c_int {
    match random::random_i32() {
        Ok(v) => v,
        Err(e) => {
            fail(&e);
            0
        }
    }
}

// ============================================================================
// Process memory map
// ============================================================================

/// One row of the per-thread process map table, laid out for C consumers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(C)]
pub struct ProcMapEntry {
    pub start: usize,
    pub end: usize,
    pub size: usize,
    pub huge_page: c_int,
    pub reserved: c_int,
    /// `Protection` bits.
    pub flags: i64,
    /// `rwxp`-style label, NUL-padded.
    pub flags_str: [c_char; 4],
    pub padding: [c_char; 20],
}

impl ProcMapEntry {
    const ZERO: ProcMapEntry = ProcMapEntry {
        start: 0,
        end: 0,
        size: 0,
        huge_page: 0,
        reserved: 0,
        flags: 0,
        flags_str: [0; 4],
        padding: [0; 20],
    };
}

impl From<&maps::MemoryRegion> for ProcMapEntry {
    fn from(region: &maps::MemoryRegion) -> Self {
        let label = region.label_bytes();
        ProcMapEntry {
            start: region.start,
            end: region.end,
            size: region.size(),
            huge_page: region.is_huge_page() as c_int,
            flags: region.protection.bits() as i64,
            flags_str: label.map(|b| b as c_char),
            ..ProcMapEntry::ZERO
        }
    }
}

thread_local! {
    static PROC_MAP: UnsafeCell<[ProcMapEntry; PROC_MAP_MAX]> =
        const { UnsafeCell::new([ProcMapEntry::ZERO; PROC_MAP_MAX]) };
}

/// Snapshot the regions of `pid` (-1 for the caller) into the calling
/// thread's table. Returns the entry count, or -1 with `errno` set. On
/// failure the previous table contents are kept.
///
/// A later call on the same thread overwrites the table.
#[no_mangle]
pub extern "C" fn safe_proc_maps(pid: pid_t) -> c_int {
    let target = match pid {
        PID_SELF => Target::Current,
        p if p >= 0 => Target::Pid(p as u32),
        _ => {
            platform::set_errno(libc::EINVAL);
            return -1;
        }
    };

    let mut table = Box::new(RegionTable::new());
    match maps::snapshot(target, &mut table) {
        Ok(count) => {
            PROC_MAP.with(|cell| {
                let rows = unsafe { &mut *cell.get() };
                for (row, region) in rows.iter_mut().zip(table.raw_entries()) {
                    *row = if region.is_empty() {
                        ProcMapEntry::ZERO
                    } else {
                        ProcMapEntry::from(region)
                    };
                }
            });
            count as c_int
        }
        Err(e) => {
            fail(&e);
            -1
        }
    }
}

/// The calling thread's table: `PROC_MAP_MAX` rows, terminated by the first
/// all-zero row.
#[no_mangle]
pub extern "C" fn safe_proc_maps_table() -> *const ProcMapEntry {
    PROC_MAP.with(|cell| cell.get() as *const ProcMapEntry)
}

// ============================================================================
// Allocation
// ============================================================================

/// Store an `alignment`-aligned block of `len` bytes in `*out`.
/// Returns 0 on success, -1 with `errno` set otherwise (`*out` is null then).
#[no_mangle]
pub unsafe extern "C" fn safe_alloc(out: *mut *mut c_void, alignment: usize, len: usize) -> c_int {
    if out.is_null() {
        platform::set_errno(libc::EINVAL);
        return -1;
    }
    match allocator::alloc(alignment, len) {
        Ok(p) => {
            *out = p.as_ptr() as *mut c_void;
            0
        }
        Err(e) => {
            *out = ptr::null_mut();
            fail(&e);
            -1
        }
    }
}

#[no_mangle]
pub extern "C" fn safe_malloc(len: usize) -> *mut c_void {
    match allocator::malloc(len) {
        Ok(p) => p.as_ptr() as *mut c_void,
        Err(e) => {
            fail(&e);
            ptr::null_mut()
        }
    }
}

#[no_mangle]
pub extern "C" fn safe_calloc(nmemb: usize, size: usize) -> *mut c_void {
    match allocator::calloc(nmemb, size) {
        Ok(p) => p.as_ptr() as *mut c_void,
        Err(e) => {
            fail(&e);
            ptr::null_mut()
        }
    }
}

/// Allocate a fresh block and release `old`. Contents are not copied unless
/// built with `realloc-copy`. Damage found on `old` sets `errno` to `EINVAL`
/// while still returning the new block.
#[no_mangle]
pub unsafe extern "C" fn safe_realloc(old: *mut c_void, len: usize) -> *mut c_void {
    match allocator::realloc(old as *mut u8, len) {
        Ok(r) => {
            if let Err(e) = &r.released {
                fail(e);
            }
            r.ptr.as_ptr() as *mut c_void
        }
        Err(e) => {
            fail(&e);
            ptr::null_mut()
        }
    }
}

/// Release `p`. `errno` is set to `EINVAL` when the header was damaged;
/// it is cleared to 0 otherwise so callers can check it after the call.
#[no_mangle]
pub unsafe extern "C" fn safe_free(p: *mut c_void) {
    match allocator::free(p as *mut u8) {
        Ok(()) => platform::set_errno(0),
        Err(e) => fail(&e),
    }
}

// ============================================================================
// Bounded strings
// ============================================================================

#[no_mangle]
pub unsafe extern "C" fn safe_strncpy(dst: *mut c_char, src: *const c_char, bound: usize) -> *mut c_char {
    string::copy_raw(dst, src, bound)
}

/// Bounded by the source's own length: `dst` must hold `strlen(src) + 1`.
#[no_mangle]
pub unsafe extern "C" fn safe_strcpy(dst: *mut c_char, src: *const c_char) -> *mut c_char {
    if dst.is_null() || src.is_null() {
        return ptr::null_mut();
    }
    string::copy_raw(dst, src, libc::strlen(src) + 1)
}

#[no_mangle]
pub unsafe extern "C" fn safe_strncat(dst: *mut c_char, src: *const c_char, bound: usize) -> *mut c_char {
    string::concat_raw(dst, src, bound)
}

/// Bounded by both lengths: `dst` must hold `strlen(dst) + strlen(src) + 1`.
#[no_mangle]
pub unsafe extern "C" fn safe_strcat(dst: *mut c_char, src: *const c_char) -> *mut c_char {
    if dst.is_null() || src.is_null() {
        return ptr::null_mut();
    }
    string::concat_raw(dst, src, libc::strlen(dst) + libc::strlen(src) + 1)
}

#[no_mangle]
pub unsafe extern "C" fn safe_strstr(haystack: *const c_char, needle: *const c_char) -> *mut c_char {
    string::find_str_raw(haystack, needle) as *mut c_char
}
