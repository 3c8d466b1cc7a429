//! Per-profile policy tables
//!
//! Each profile compiles to three immutable pieces: a syscall allow-list, a
//! rlimit vector, and the namespace mask used at clone time. Everything is a
//! compile-time constant, so a misconfigured policy fails at build time, not
//! inside an untrusted process.

pub mod syscall_table;

use crate::isolation::namespace::NamespaceConfig;
use crate::resources::rlimit::RlimitPolicy;

/// Filter behavior when the child invokes a syscall outside the allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationAction {
    /// Kill the process immediately
    Kill,
    /// Allow the syscall and leave a kernel audit record
    Record,
}

/// Syscalls a minimal dynamically-started program needs to load, run and exit.
/// Anything else is a violation under the strict profile.
const STRICT_SYSCALLS: &[&str] = &[
    "execve",
    "exit",
    "exit_group",
    "brk",
    "mmap",
    "munmap",
    "mprotect",
    "arch_prctl",
    "read",
    "write",
    "writev",
    "lseek",
    "close",
    "fstat",
    "openat",
    "readlink",
    "getrandom",
];

/// Strict set plus the calls a program needs to observe its own resource
/// consumption (clocks, rusage, sysinfo) and to sleep.
const RESOURCE_AWARE_SYSCALLS: &[&str] = &[
    "execve",
    "exit",
    "exit_group",
    "brk",
    "mmap",
    "munmap",
    "mprotect",
    "arch_prctl",
    "read",
    "write",
    "writev",
    "lseek",
    "close",
    "fstat",
    "openat",
    "readlink",
    "getrandom",
    "getrusage",
    "sysinfo",
    "clock_gettime",
    "gettimeofday",
    "nanosleep",
    "clock_nanosleep",
];

const STRICT_RLIMITS: RlimitPolicy = RlimitPolicy {
    stack_bytes: 8 * 1024 * 1024,
    open_files: 64,
    address_space_bytes: 128 * 1024 * 1024,
    processes: 20,
};

/// Relaxed ceilings for workloads that legitimately need more headroom; the
/// values that exist purely as cgroup fallback grow, the stack cap does not.
const RESOURCE_AWARE_RLIMITS: RlimitPolicy = RlimitPolicy {
    stack_bytes: 8 * 1024 * 1024,
    open_files: 256,
    address_space_bytes: 512 * 1024 * 1024,
    processes: 64,
};

/// Named policy bundle selecting an allow-list, a rlimit vector and a
/// namespace mask for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Kill on any syscall outside the minimal allow-list
    Strict,
    /// Strict plus self-observation syscalls and relaxed rlimit ceilings
    ResourceAware,
    /// Same allow-list as strict, but violations are recorded, not fatal
    Learning,
}

impl Profile {
    /// Get all profiles
    pub fn all() -> Vec<Self> {
        vec![Profile::Strict, Profile::ResourceAware, Profile::Learning]
    }

    /// Parse a profile tag, case-insensitively. Returns `None` for unknown
    /// tags so the caller can warn and pick a fallback.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_lowercase().as_str() {
            "strict" => Some(Profile::Strict),
            "resource-aware" | "resource_aware" => Some(Profile::ResourceAware),
            "learning" => Some(Profile::Learning),
            _ => None,
        }
    }

    /// Canonical lowercase profile name, as it appears in the telemetry log
    pub fn name(&self) -> &'static str {
        match self {
            Profile::Strict => "strict",
            Profile::ResourceAware => "resource-aware",
            Profile::Learning => "learning",
        }
    }

    /// The syscall allow-list for this profile
    pub fn allowed_syscalls(&self) -> &'static [&'static str] {
        match self {
            Profile::Strict | Profile::Learning => STRICT_SYSCALLS,
            Profile::ResourceAware => RESOURCE_AWARE_SYSCALLS,
        }
    }

    /// The rlimit vector applied inside the child
    pub fn rlimits(&self) -> RlimitPolicy {
        match self {
            Profile::Strict | Profile::Learning => STRICT_RLIMITS,
            Profile::ResourceAware => RESOURCE_AWARE_RLIMITS,
        }
    }

    /// Namespace mask used at clone time; identical for every profile
    pub fn namespaces(&self) -> NamespaceConfig {
        NamespaceConfig::all()
    }

    /// What the filter does on a syscall outside the allow-list
    pub fn violation_action(&self) -> ViolationAction {
        match self {
            Profile::Strict | Profile::ResourceAware => ViolationAction::Kill,
            Profile::Learning => ViolationAction::Record,
        }
    }
}
