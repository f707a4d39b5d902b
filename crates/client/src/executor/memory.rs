//! Resident memory probing for the executor's pressure guard.

use std::fmt::Debug;

/// Reports the process's resident memory.
pub trait MemoryProbe: Debug + Send + Sync {
    /// Resident bytes, or `None` when the platform gives no answer.
    fn resident_bytes(&self) -> Option<u64>;
}

/// Reads resident set size from procfs. Returns `None` off Linux.
///
/// Uses the `VmRSS` line of `/proc/self/status`, which the kernel reports in
/// kB whatever the page size.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcMemoryProbe;

impl MemoryProbe for ProcMemoryProbe {
    fn resident_bytes(&self) -> Option<u64> {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        parse_vm_rss(&status)
    }
}

/// `VmRSS:    123456 kB` → bytes.
fn parse_vm_rss(status: &str) -> Option<u64> {
    let line = status.lines().find_map(|line| line.strip_prefix("VmRSS:"))?;
    let mut fields = line.split_whitespace();
    let value = fields.next()?.parse::<u64>().ok()?;
    match fields.next() {
        Some("kB") | None => Some(value * 1024),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vm_rss() {
        let status = "Name:\tbestof-mcp\nVmPeak:\t  300000 kB\nVmRSS:\t    4096 kB\nThreads:\t8\n";
        assert_eq!(parse_vm_rss(status), Some(4096 * 1024));

        assert_eq!(parse_vm_rss("Name:\tbestof-mcp\n"), None);
        assert_eq!(parse_vm_rss("VmRSS:\tlots kB\n"), None);
        assert_eq!(parse_vm_rss("VmRSS:\t12 pages\n"), None);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_proc_probe_reports_something() {
        let bytes = ProcMemoryProbe.resident_bytes().unwrap();
        assert!(bytes > 0);
    }
}
