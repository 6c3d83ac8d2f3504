#![no_main]

use libfuzzer_sys::fuzz_target;
use safelibs::allocator;

/// Fuzz target that interprets a byte slice as a sequence of allocator operations.
///
/// Each operation is encoded as:
///   byte 0: opcode (0=malloc, 1=free, 2=realloc, 3=calloc, 4=alloc)
///   byte 1-2: size (little-endian u16)
///   byte 3: slot index (which tracked pointer to operate on)
///
/// Each live payload carries a slot-specific fill; it must survive every
/// unrelated operation, and no free may report a damaged header.
const MAX_SLOTS: usize = 64;

fn pattern(slot: usize) -> u8 {
    (slot as u8) | 0x40
}

unsafe fn check(ptr: *mut u8, size: usize, slot: usize) {
    let n = size.min(256);
    let s = std::slice::from_raw_parts(ptr, n);
    assert!(s.iter().all(|&b| b == pattern(slot)), "slot {} payload changed", slot);
}

unsafe fn release(ptr: *mut u8) {
    allocator::free(ptr).expect("free reported corruption on an untouched block");
}

fuzz_target!(|data: &[u8]| {
    let mut slots: [*mut u8; MAX_SLOTS] = [std::ptr::null_mut(); MAX_SLOTS];
    let mut sizes: [usize; MAX_SLOTS] = [0; MAX_SLOTS];

    let mut i = 0;
    while i + 4 <= data.len() {
        let opcode = data[i] % 5;
        let size = u16::from_le_bytes([data[i + 1], data[i + 2]]) as usize;
        let slot = (data[i + 3] as usize) % MAX_SLOTS;
        i += 4;

        if !slots[slot].is_null() {
            unsafe { check(slots[slot], sizes[slot], slot) };
        }

        let fresh = match opcode {
            0 => {
                if !slots[slot].is_null() {
                    unsafe { release(slots[slot]) };
                }
                allocator::malloc(size).ok()
            }
            1 => {
                if !slots[slot].is_null() {
                    unsafe { release(slots[slot]) };
                }
                None
            }
            2 => match unsafe { allocator::realloc(slots[slot], size) } {
                Ok(r) => {
                    r.released.expect("realloc reported corruption on an untouched block");
                    Some(r.ptr)
                }
                // The old block is still live on failure.
                Err(_) => continue,
            },
            3 => {
                if !slots[slot].is_null() {
                    unsafe { release(slots[slot]) };
                }
                let nmemb = (size >> 8).max(1);
                let elem = (size & 0xFF).max(1);
                let total = nmemb * elem;
                let p = allocator::calloc(nmemb, elem).ok();
                if let Some(p) = p {
                    let s = unsafe { std::slice::from_raw_parts(p.as_ptr(), total.min(256)) };
                    assert!(s.iter().all(|&b| b == 0), "calloc memory not zeroed");
                    sizes[slot] = total;
                }
                p
            }
            4 => {
                if !slots[slot].is_null() {
                    unsafe { release(slots[slot]) };
                }
                let align = 1usize << (size >> 12).min(12);
                let len = size & 0xFFF;
                let p = allocator::alloc(align, len).ok();
                if let Some(p) = p {
                    assert_eq!(p.as_ptr() as usize % align.max(16), 0);
                    sizes[slot] = len;
                }
                p
            }
            _ => unreachable!(),
        };

        match fresh {
            Some(p) => {
                slots[slot] = p.as_ptr();
                if opcode == 0 || opcode == 2 {
                    sizes[slot] = size;
                }
                unsafe { std::ptr::write_bytes(p.as_ptr(), pattern(slot), sizes[slot].min(256)) };
            }
            None => {
                slots[slot] = std::ptr::null_mut();
                sizes[slot] = 0;
            }
        }
    }

    for slot in &mut slots {
        if !slot.is_null() {
            unsafe { release(*slot) };
            *slot = std::ptr::null_mut();
        }
    }
});
