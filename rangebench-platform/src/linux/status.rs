/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::{
    fs::File,
    io::{self, BufRead},
    path::Path,
};

use crate::MemoryFootprint;

const STATUS_FILE: &str = "/proc/self/status";

/// Read the memory footprint of the current process from `/proc/self/status`.
///
/// Only the `Name`, `VmPeak` and `VmHWM` fields are retained. `VmHWM` might be inaccurate
/// according to proc(5); `/proc/[pid]/smaps_rollup` is exact but much slower.
pub fn memory_footprint() -> io::Result<MemoryFootprint> {
    let file = File::open(Path::new(STATUS_FILE))?;
    parse_status(io::BufReader::new(file), std::process::id())
}

/// Parse the contents of a `/proc/<pid>/status` file.
pub fn parse_status<R>(reader: R, pid: u32) -> io::Result<MemoryFootprint>
where
    R: BufRead,
{
    let mut footprint = MemoryFootprint {
        pid,
        ..MemoryFootprint::default()
    };

    for line in reader.lines() {
        let line = line?;
        if let Some(rest) = line.strip_prefix("Name:") {
            footprint.name = Some(rest.trim().to_owned());
        } else if let Some(rest) = line.strip_prefix("VmPeak:") {
            footprint.vm_peak_kb = parse_kb(rest);
        } else if let Some(rest) = line.strip_prefix("VmHWM:") {
            footprint.vm_hwm_kb = parse_kb(rest);
        } else {
            continue;
        }
        footprint.lines.push(line);
    }

    Ok(footprint)
}

// Values look like "\t  123456 kB".
fn parse_kb(value: &str) -> Option<u64> {
    value.split_whitespace().next()?.parse::<u64>().ok()
}

///////////
// Tests //
///////////
