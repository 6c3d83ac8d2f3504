//! Process memory-map introspection.
//!
//! [`snapshot`] enumerates the virtual memory regions of a process into a
//! caller-owned, fixed-capacity [`RegionTable`]. Each OS family has its own
//! [`RegionSource`]:
//!
//! - Linux/Android: the textual `/proc/<pid>/maps` listing ([`procfs`]).
//! - FreeBSD: the `KERN_PROC_VMMAP` sysctl table ([`sysctl`]).
//! - macOS: a recursive `mach_vm_region_recurse` walk ([`mach`]).
//!
//! Anything else reports [`Error::Unsupported`] and leaves the table alone.

pub mod procfs;
#[cfg(target_os = "freebsd")]
pub mod sysctl;
#[cfg(target_os = "macos")]
pub mod mach;

use crate::error::{Error, Result};
use crate::util::{HUGE_PAGE_THRESHOLD, PROC_MAP_MAX};
use bitflags::bitflags;

bitflags! {
    /// Access permissions of a region.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Protection: u32 {
        const READ = 0x1;
        const WRITE = 0x2;
        const EXEC = 0x4;
    }
}

/// One virtual memory region: `[start, end)` plus its permissions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryRegion {
    pub start: usize,
    pub end: usize,
    pub protection: Protection,
    label: [u8; 4],
}

impl MemoryRegion {
    /// An all-zero entry; the first one in a table terminates it.
    pub const EMPTY: MemoryRegion = MemoryRegion {
        start: 0,
        end: 0,
        protection: Protection::empty(),
        label: [0; 4],
    };

    /// Build a region. `sharing` is the optional fourth label character
    /// (`p` for private, `s` for shared) when the source reports one.
    pub fn new(start: usize, end: usize, protection: Protection, sharing: Option<u8>) -> Self {
        let flag = |set: bool, c: u8| if set { c } else { b'-' };
        let label = [
            flag(protection.contains(Protection::READ), b'r'),
            flag(protection.contains(Protection::WRITE), b'w'),
            flag(protection.contains(Protection::EXEC), b'x'),
            sharing.unwrap_or(0),
        ];
        MemoryRegion {
            start,
            end,
            protection,
            label,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub fn is_huge_page(&self) -> bool {
        self.size() >= HUGE_PAGE_THRESHOLD
    }

    #[inline]
    pub fn contains(&self, addr: usize) -> bool {
        self.start <= addr && addr < self.end
    }

    /// Human-readable permissions, `r-xp` style (3 or 4 characters).
    pub fn label(&self) -> &str {
        let len = self.label.iter().position(|&b| b == 0).unwrap_or(4);
        // Only ASCII is ever stored.
        core::str::from_utf8(&self.label[..len]).unwrap_or("")
    }

    /// Raw label bytes, NUL-padded.
    pub fn label_bytes(&self) -> [u8; 4] {
        self.label
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

/// Fixed-capacity snapshot of a process's regions.
///
/// Entries past `len()` are always zeroed, so the first empty entry acts as a
/// terminator for consumers that walk the raw array.
#[derive(Clone)]
pub struct RegionTable {
    entries: [MemoryRegion; PROC_MAP_MAX],
    len: usize,
    truncated: bool,
}

impl RegionTable {
    pub const CAPACITY: usize = PROC_MAP_MAX;

    pub const fn new() -> Self {
        RegionTable {
            entries: [MemoryRegion::EMPTY; PROC_MAP_MAX],
            len: 0,
            truncated: false,
        }
    }

    /// Reset to an empty, fully zeroed table.
    pub fn clear(&mut self) {
        self.entries = [MemoryRegion::EMPTY; PROC_MAP_MAX];
        self.len = 0;
        self.truncated = false;
    }

    /// Append a region. Returns `false` and marks the table truncated once
    /// capacity is reached; the region is dropped.
    pub fn push(&mut self, region: MemoryRegion) -> bool {
        if self.len == Self::CAPACITY {
            self.truncated = true;
            return false;
        }
        self.entries[self.len] = region;
        self.len += 1;
        true
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether regions were dropped because the table was full.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn as_slice(&self) -> &[MemoryRegion] {
        &self.entries[..self.len]
    }

    /// All `CAPACITY` slots, including the zeroed tail.
    pub fn raw_entries(&self) -> &[MemoryRegion; PROC_MAP_MAX] {
        &self.entries
    }

    pub fn iter(&self) -> core::slice::Iter<'_, MemoryRegion> {
        self.as_slice().iter()
    }

    /// The region containing `addr`, if any.
    pub fn find(&self, addr: usize) -> Option<&MemoryRegion> {
        self.iter().find(|r| r.contains(addr))
    }
}

impl Default for RegionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a RegionTable {
    type Item = &'a MemoryRegion;
    type IntoIter = core::slice::Iter<'a, MemoryRegion>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Which process to introspect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// The calling process.
    Current,
    Pid(u32),
}

impl Target {
    fn resolve(self) -> u32 {
        match self {
            Target::Current => crate::platform::current_pid(),
            Target::Pid(pid) => pid,
        }
    }
}

/// An OS interface able to enumerate a process's regions.
///
/// Implementations clear `table` only once they hold the data to refill it,
/// so a failure before that point leaves the previous contents in place.
pub trait RegionSource {
    fn collect(&self, pid: u32, table: &mut RegionTable) -> Result<()>;
}

#[cfg(any(target_os = "linux", target_os = "android"))]
type PlatformSource = procfs::ProcfsSource;
#[cfg(target_os = "freebsd")]
type PlatformSource = sysctl::SysctlSource;
#[cfg(target_os = "macos")]
type PlatformSource = mach::MachSource;
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "macos"
)))]
type PlatformSource = Unsupported;

/// Source for targets with no region-enumeration interface.
#[derive(Default)]
pub struct Unsupported;

impl RegionSource for Unsupported {
    fn collect(&self, _pid: u32, _table: &mut RegionTable) -> Result<()> {
        Err(Error::Unsupported)
    }
}

/// Snapshot the regions of `target` into `table`, returning the entry count.
///
/// At most [`RegionTable::CAPACITY`] regions are kept; the rest are dropped
/// silently (see [`RegionTable::is_truncated`]).
pub fn snapshot(target: Target, table: &mut RegionTable) -> Result<usize> {
    snapshot_with(&PlatformSource::default(), target, table)
}

/// [`snapshot`] through an explicit source.
pub fn snapshot_with<S: RegionSource>(
    source: &S,
    target: Target,
    table: &mut RegionTable,
) -> Result<usize> {
    let pid = target.resolve();
    match source.collect(pid, table) {
        Ok(()) => {
            if table.is_truncated() {
                log::debug!(
                    "safelibs: process map of pid {} truncated at {} entries",
                    pid,
                    RegionTable::CAPACITY
                );
            }
            Ok(table.len())
        }
        Err(Error::Unsupported) => {
            log::warn!("safelibs: process map introspection is not supported on this platform");
            Err(Error::Unsupported)
        }
        Err(e) => Err(e),
    }
}
