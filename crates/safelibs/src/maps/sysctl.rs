//! FreeBSD `KERN_PROC_VMMAP` reader.
//!
//! The kernel returns packed, variable-length `kinfo_vmentry` records; each
//! record's `kve_structsize` gives the stride to the next one.

use super::{MemoryRegion, Protection, RegionSource, RegionTable};
use crate::error::{Error, Result};
use core::mem::{size_of, MaybeUninit};
use core::ptr;

#[derive(Default)]
pub struct SysctlSource;

impl RegionSource for SysctlSource {
    fn collect(&self, pid: u32, table: &mut RegionTable) -> Result<()> {
        let mib = [
            libc::CTL_KERN,
            libc::KERN_PROC,
            libc::KERN_PROC_VMMAP,
            pid as libc::c_int,
        ];

        let mut len: libc::size_t = 0;
        let ret = unsafe {
            libc::sysctl(mib.as_ptr(), mib.len() as libc::c_uint, ptr::null_mut(), &mut len, ptr::null(), 0)
        };
        if ret == -1 {
            return Err(Error::Os(std::io::Error::last_os_error()));
        }

        // The map can grow between the two calls.
        len = len * 4 / 3;
        let mut buf = vec![0u8; len];
        let ret = unsafe {
            libc::sysctl(
                mib.as_ptr(),
                mib.len() as libc::c_uint,
                buf.as_mut_ptr() as *mut libc::c_void,
                &mut len,
                ptr::null(),
                0,
            )
        };
        if ret == -1 {
            return Err(Error::Os(std::io::Error::last_os_error()));
        }

        table.clear();
        walk_records(&buf[..len.min(buf.len())], table);
        Ok(())
    }
}

fn walk_records(buf: &[u8], table: &mut RegionTable) {
    let mut off = 0usize;
    while off + size_of::<libc::c_int>() <= buf.len() {
        let structsize = unsafe { (buf.as_ptr().add(off) as *const libc::c_int).read_unaligned() };
        if structsize <= 0 {
            break;
        }
        let structsize = structsize as usize;

        let mut entry = MaybeUninit::<libc::kinfo_vmentry>::zeroed();
        let take = structsize.min(size_of::<libc::kinfo_vmentry>()).min(buf.len() - off);
        let entry = unsafe {
            ptr::copy_nonoverlapping(buf.as_ptr().add(off), entry.as_mut_ptr() as *mut u8, take);
            entry.assume_init()
        };

        let mut protection = Protection::empty();
        protection.set(Protection::READ, entry.kve_protection & libc::KVME_PROT_READ != 0);
        protection.set(Protection::WRITE, entry.kve_protection & libc::KVME_PROT_WRITE != 0);
        protection.set(Protection::EXEC, entry.kve_protection & libc::KVME_PROT_EXEC != 0);

        let region = MemoryRegion::new(
            entry.kve_start as usize,
            entry.kve_end as usize,
            protection,
            None,
        );
        if !table.push(region) {
            break;
        }
        off += structsize;
    }
}
