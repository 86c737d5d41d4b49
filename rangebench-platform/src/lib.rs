/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */
#![cfg_attr(
    not(test),
    warn(clippy::panic, clippy::unwrap_used, clippy::expect_used)
)]

use serde::Serialize;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "linux")]
pub use linux::*;

#[cfg(not(target_os = "linux"))]
pub mod other;

#[cfg(not(target_os = "linux"))]
pub use other::*;

/// The memory footprint of the current process as reported by the operating system.
///
/// `lines` keeps the raw `Name:`, `VmPeak:` and `VmHWM:` entries verbatim so they can be
/// echoed unchanged for downstream tooling that parses them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemoryFootprint {
    pub pid: u32,
    pub name: Option<String>,
    /// Peak virtual memory in kB.
    pub vm_peak_kb: Option<u64>,
    /// Peak resident set size in kB.
    pub vm_hwm_kb: Option<u64>,
    #[serde(skip)]
    pub lines: Vec<String>,
}

impl MemoryFootprint {
    /// Peak resident set size in bytes.
    pub fn peak_resident_bytes(&self) -> Option<u64> {
        self.vm_hwm_kb.map(|kb| kb * 1024)
    }

    /// Peak virtual memory in bytes.
    pub fn peak_virtual_bytes(&self) -> Option<u64> {
        self.vm_peak_kb.map(|kb| kb * 1024)
    }
}

impl std::fmt::Display for MemoryFootprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "PID: {}", self.pid)?;
        for line in self.lines.iter() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
