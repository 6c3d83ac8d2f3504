//! macOS region walk via `mach_vm_region_recurse`.
//!
//! The walk starts at address 0 and advances region by region. A region
//! flagged `is_submap` is not a leaf: the same address is queried again one
//! nesting level deeper.

use super::{MemoryRegion, Protection, RegionSource, RegionTable};
use crate::error::{Error, Result};
use core::mem::size_of;

type KernReturn = libc::c_int;
type MachPort = libc::c_uint;

const KERN_SUCCESS: KernReturn = 0;
const VM_PROT_READ: libc::c_int = 0x1;
const VM_PROT_WRITE: libc::c_int = 0x2;
const VM_PROT_EXECUTE: libc::c_int = 0x4;

/// `vm_region_submap_info_64` from <mach/vm_region.h> (packed to 4).
#[repr(C, packed(4))]
#[derive(Default)]
struct SubmapInfo64 {
    protection: libc::c_int,
    max_protection: libc::c_int,
    inheritance: libc::c_uint,
    offset: u64,
    user_tag: libc::c_uint,
    pages_resident: libc::c_uint,
    pages_shared_now_private: libc::c_uint,
    pages_swapped_out: libc::c_uint,
    pages_dirtied: libc::c_uint,
    ref_count: libc::c_uint,
    shadow_depth: libc::c_ushort,
    external_pager: libc::c_uchar,
    share_mode: libc::c_uchar,
    is_submap: libc::c_int,
    behavior: libc::c_int,
    object_id: libc::c_uint,
    user_wired_count: libc::c_ushort,
    pages_reusable: libc::c_uint,
    object_id_full: u64,
}

const SUBMAP_INFO_COUNT_64: libc::c_uint = (size_of::<SubmapInfo64>() / size_of::<libc::c_int>()) as libc::c_uint;

extern "C" {
    static mach_task_self_: MachPort;

    fn mach_vm_region_recurse(
        target_task: MachPort,
        address: *mut u64,
        size: *mut u64,
        nesting_depth: *mut libc::c_uint,
        info: *mut libc::c_int,
        info_count: *mut libc::c_uint,
    ) -> KernReturn;
}

#[derive(Default)]
pub struct MachSource;

impl RegionSource for MachSource {
    fn collect(&self, pid: u32, table: &mut RegionTable) -> Result<()> {
        // Other tasks need task_for_pid and its entitlements.
        if pid != crate::platform::current_pid() {
            return Err(Error::Unsupported);
        }
        let task = unsafe { mach_task_self_ };

        table.clear();
        let mut address: u64 = 0;
        let mut depth: libc::c_uint = 0;
        loop {
            let mut size: u64 = 0;
            let mut info = SubmapInfo64::default();
            let mut count = SUBMAP_INFO_COUNT_64;
            let kr = unsafe {
                mach_vm_region_recurse(
                    task,
                    &mut address,
                    &mut size,
                    &mut depth,
                    &mut info as *mut SubmapInfo64 as *mut libc::c_int,
                    &mut count,
                )
            };
            // KERN_INVALID_ADDRESS once we walk past the last region.
            if kr != KERN_SUCCESS {
                return Ok(());
            }
            if info.is_submap != 0 {
                depth += 1;
                continue;
            }

            let prot = info.protection;
            let mut protection = Protection::empty();
            protection.set(Protection::READ, prot & VM_PROT_READ != 0);
            protection.set(Protection::WRITE, prot & VM_PROT_WRITE != 0);
            protection.set(Protection::EXEC, prot & VM_PROT_EXECUTE != 0);

            let end = address.saturating_add(size);
            if !table.push(MemoryRegion::new(address as usize, end as usize, protection, None)) {
                return Ok(());
            }
            address = end;
        }
    }
}
