//! Runtime detection of available sandboxing facilities
//!
//! Probes the running kernel and system configuration so an operator can see
//! up front why a run would fail. Diagnostics only; the launcher never
//! degrades policy based on what it finds here.

/// Detected host capabilities relevant to the launcher
#[derive(Debug, Clone)]
pub struct SystemCapabilities {
    /// Running as root (euid == 0)
    pub has_root: bool,
    /// Unprivileged user namespaces are available
    pub has_user_namespaces: bool,
    /// Seccomp BPF filtering is available
    pub has_seccomp: bool,
    /// Cgroup v2 unified hierarchy is mounted (used by the outer wrapper)
    pub has_cgroup_v2: bool,
}

impl SystemCapabilities {
    /// Detect all capabilities on the current system
    pub fn detect() -> Self {
        Self {
            has_root: detect_root(),
            has_user_namespaces: detect_user_namespaces(),
            has_seccomp: detect_seccomp(),
            has_cgroup_v2: detect_cgroup_v2(),
        }
    }

    /// Get a human-readable summary of capabilities
    pub fn summary(&self) -> String {
        let check = |available: bool| if available { "[ok]" } else { "[--]" };

        [
            format!("{} Root privileges", check(self.has_root)),
            format!("{} User namespaces", check(self.has_user_namespaces)),
            format!("{} Seccomp BPF", check(self.has_seccomp)),
            format!("{} Cgroup v2", check(self.has_cgroup_v2)),
        ]
        .join("\n")
    }
}

fn detect_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

fn detect_user_namespaces() -> bool {
    if let Ok(content) = std::fs::read_to_string("/proc/sys/kernel/unprivileged_userns_clone")
        && content.trim() == "0"
    {
        return false;
    }

    if let Ok(content) = std::fs::read_to_string("/proc/sys/user/max_user_namespaces")
        && let Ok(max) = content.trim().parse::<u64>()
    {
        return max > 0;
    }

    // If the knobs are unreadable, assume available on modern kernels
    true
}

fn detect_seccomp() -> bool {
    let ret = unsafe { libc::prctl(libc::PR_GET_SECCOMP, 0, 0, 0, 0) };
    ret >= 0
}

fn detect_cgroup_v2() -> bool {
    std::path::Path::new("/sys/fs/cgroup/cgroup.controllers").exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_runs() {
        let caps = SystemCapabilities::detect();
        // Seccomp has been in every mainline kernel this crate targets
        assert!(caps.has_seccomp);
    }

    #[test]
    fn test_summary_lists_every_probe() {
        let caps = SystemCapabilities::detect();
        let summary = caps.summary();
        assert!(summary.contains("User namespaces"));
        assert!(summary.contains("Seccomp BPF"));
        assert!(summary.contains("Cgroup v2"));
        assert_eq!(summary.lines().count(), 4);
    }
}
