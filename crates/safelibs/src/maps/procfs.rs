//! `/proc/<pid>/maps` reader.
//!
//! Each line looks like
//! `55d0c2a4e000-55d0c2a50000 r--p 00000000 fd:01 1048602   /usr/bin/cat`;
//! only the address range and the permission column are used.

use super::{MemoryRegion, Protection, RegionSource, RegionTable};
use crate::error::Result;
use std::fs::File;
use std::io::{BufRead, BufReader};

#[derive(Default)]
pub struct ProcfsSource;

impl RegionSource for ProcfsSource {
    fn collect(&self, pid: u32, table: &mut RegionTable) -> Result<()> {
        let file = File::open(format!("/proc/{}/maps", pid))?;
        table.clear();
        read_into(BufReader::new(file), table)
    }
}

/// Parse every line of a maps listing into `table`, stopping at capacity.
/// Lines that do not parse are skipped.
pub fn read_into<R: BufRead>(mut reader: R, table: &mut RegionTable) -> Result<()> {
    let mut line = Vec::with_capacity(256);
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(());
        }
        if let Some(region) = parse_line(&line) {
            if !table.push(region) {
                return Ok(());
            }
        }
    }
}

/// Parse one maps line.
pub fn parse_line(line: &[u8]) -> Option<MemoryRegion> {
    let mut fields = line
        .split(|b| b.is_ascii_whitespace())
        .filter(|f| !f.is_empty());
    let range = fields.next()?;
    let perms = fields.next()?;

    let dash = range.iter().position(|&b| b == b'-')?;
    let start = parse_hex(&range[..dash])?;
    let end = parse_hex(&range[dash + 1..])?;
    if end < start || perms.len() < 3 {
        return None;
    }

    let mut protection = Protection::empty();
    protection.set(Protection::READ, perms[0] == b'r');
    protection.set(Protection::WRITE, perms[1] == b'w');
    protection.set(Protection::EXEC, perms[2] == b'x');
    let sharing = perms.get(3).copied().filter(|c| matches!(c, b'p' | b's'));

    Some(MemoryRegion::new(start, end, protection, sharing))
}

fn parse_hex(digits: &[u8]) -> Option<usize> {
    if digits.is_empty() {
        return None;
    }
    usize::from_str_radix(core::str::from_utf8(digits).ok()?, 16).ok()
}
