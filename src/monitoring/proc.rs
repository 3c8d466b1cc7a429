//! /proc readers for liveness and usage sampling
//!
//! The supervisor polls these while the child runs. Both files are read-only
//! kernel snapshots; a vanished file simply means the child is gone.

use crate::errors::{LauncherError, Result};
use std::fs;

/// Cumulative usage counters for one process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcUsage {
    /// User-mode CPU ticks, self plus waited-for children
    pub utime_ticks: u64,
    /// Kernel-mode CPU ticks
    pub stime_ticks: u64,
    /// Minor page faults (no disk I/O)
    pub minor_faults: u64,
    /// Major page faults (disk I/O)
    pub major_faults: u64,
    /// High-water mark of virtual memory, in KiB
    pub vm_peak_kb: u64,
}

impl ProcUsage {
    /// Read `/proc/<pid>/stat` and `/proc/<pid>/status` for a live process.
    pub fn read(pid: i32) -> Result<Self> {
        let stat_path = format!("/proc/{}/stat", pid);
        let stat = fs::read_to_string(&stat_path).map_err(|e| {
            LauncherError::ProcessMonitoring(format!("Failed to read {}: {}", stat_path, e))
        })?;

        let mut usage = parse_stat(&stat).ok_or_else(|| {
            LauncherError::ProcessMonitoring(format!("Invalid format in {}", stat_path))
        })?;

        // VmPeak is absent for kernel threads; treat missing as zero.
        let status = fs::read_to_string(format!("/proc/{}/status", pid)).unwrap_or_default();
        usage.vm_peak_kb = parse_vm_peak(&status).unwrap_or(0);

        Ok(usage)
    }

    /// Total CPU ticks consumed so far
    pub fn total_ticks(&self) -> u64 {
        self.utime_ticks + self.stime_ticks
    }
}

/// Parse the numeric fields of a stat line. The comm field may contain spaces
/// and parentheses, so everything is indexed from the last `)`.
fn parse_stat(content: &str) -> Option<ProcUsage> {
    let rest = &content[content.rfind(')')? + 1..];
    let fields: Vec<&str> = rest.split_whitespace().collect();
    if fields.len() < 13 {
        return None;
    }

    // After the comm field: state ppid pgrp session tty_nr tpgid flags
    // minflt cminflt majflt cmajflt utime stime
    let minflt: u64 = fields[7].parse().ok()?;
    let cminflt: u64 = fields[8].parse().ok()?;
    let majflt: u64 = fields[9].parse().ok()?;
    let cmajflt: u64 = fields[10].parse().ok()?;
    let utime: u64 = fields[11].parse().ok()?;
    let stime: u64 = fields[12].parse().ok()?;

    Some(ProcUsage {
        utime_ticks: utime,
        stime_ticks: stime,
        minor_faults: minflt + cminflt,
        major_faults: majflt + cmajflt,
        vm_peak_kb: 0,
    })
}

/// Extract the VmPeak value (KiB) from a /proc status document.
fn parse_vm_peak(content: &str) -> Option<u64> {
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("VmPeak:") {
            return rest.trim().trim_end_matches("kB").trim().parse().ok();
        }
    }
    None
}

/// Kernel clock ticks per second (USER_HZ), used to convert stat ticks to time
pub fn clock_ticks_per_second() -> u64 {
    let clk = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if clk > 0 { clk as u64 } else { 100 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stat_plain_comm() {
        let line = "1234 (cat) R 1 1234 1234 0 -1 4194304 120 7 3 1 50 25 0 0 20 0 1 0 100 1000000 50 18446744073709551615";
        let usage = parse_stat(line).unwrap();
        assert_eq!(usage.minor_faults, 120 + 7);
        assert_eq!(usage.major_faults, 3 + 1);
        assert_eq!(usage.utime_ticks, 50);
        assert_eq!(usage.stime_ticks, 25);
        assert_eq!(usage.total_ticks(), 75);
    }

    #[test]
    fn test_parse_stat_comm_with_parens_and_spaces() {
        let line = "42 (tricky (name) x) S 1 42 42 0 -1 0 9 1 2 0 7 8 0 0 20 0 1 0 0 0 0 0";
        let usage = parse_stat(line).unwrap();
        assert_eq!(usage.minor_faults, 10);
        assert_eq!(usage.major_faults, 2);
        assert_eq!(usage.utime_ticks, 7);
        assert_eq!(usage.stime_ticks, 8);
    }

    #[test]
    fn test_parse_stat_truncated_is_none() {
        assert!(parse_stat("1 (short) R 1 2 3").is_none());
        assert!(parse_stat("garbage without parens").is_none());
    }

    #[test]
    fn test_parse_vm_peak() {
        let status = "Name:\tcat\nVmPeak:\t  123456 kB\nVmSize:\t  100000 kB\n";
        assert_eq!(parse_vm_peak(status), Some(123456));
    }

    #[test]
    fn test_parse_vm_peak_missing() {
        assert_eq!(parse_vm_peak("Name:\tkthreadd\n"), None);
    }

    #[test]
    fn test_read_self() {
        let pid = std::process::id() as i32;
        let usage = ProcUsage::read(pid).unwrap();
        assert!(usage.vm_peak_kb > 0);
    }

    #[test]
    fn test_read_missing_process() {
        assert!(ProcUsage::read(9_999_999).is_err());
    }

    #[test]
    fn test_clock_ticks_positive() {
        assert!(clock_ticks_per_second() > 0);
    }
}
