//! setrlimit ceilings (no privileges needed)
//!
//! Applied inside the child after clone and before the seccomp filter loads.
//! These cap consumables cgroups do not directly govern (stack, FDs, address
//! space) and stand in when no cgroup has been configured around the run.

use crate::errors::{LauncherError, Result};

/// Per-process kernel-enforced ceilings for one profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RlimitPolicy {
    /// RLIMIT_STACK in bytes
    pub stack_bytes: u64,
    /// RLIMIT_NOFILE
    pub open_files: u64,
    /// RLIMIT_AS in bytes
    pub address_space_bytes: u64,
    /// RLIMIT_NPROC
    pub processes: u64,
}

impl RlimitPolicy {
    /// Apply the vector to the current process. Both soft and hard limits are
    /// set, so the ceiling cannot be raised again within the run.
    pub fn apply(&self) -> Result<()> {
        set_rlimit(libc::RLIMIT_STACK, self.stack_bytes)?;
        set_rlimit(libc::RLIMIT_NOFILE, self.open_files)?;
        set_rlimit(libc::RLIMIT_AS, self.address_space_bytes)?;
        set_rlimit(libc::RLIMIT_NPROC, self.processes)?;
        Ok(())
    }
}

fn set_rlimit(resource: libc::__rlimit_resource_t, limit: u64) -> Result<()> {
    let rlim = libc::rlimit {
        rlim_cur: limit,
        rlim_max: limit,
    };

    let ret = unsafe { libc::setrlimit(resource, &rlim) };
    if ret != 0 {
        let resource_name = match resource {
            libc::RLIMIT_STACK => "RLIMIT_STACK",
            libc::RLIMIT_NOFILE => "RLIMIT_NOFILE",
            libc::RLIMIT_AS => "RLIMIT_AS",
            libc::RLIMIT_NPROC => "RLIMIT_NPROC",
            _ => "UNKNOWN",
        };
        return Err(LauncherError::Syscall(format!(
            "setrlimit({}) failed: {}",
            resource_name,
            std::io::Error::last_os_error()
        )));
    }
    Ok(())
}
