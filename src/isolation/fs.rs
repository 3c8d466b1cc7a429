//! Child-side mount surgery
//!
//! Runs inside the new mount namespace before any untrusted code: first cut
//! propagation to the host, then pin the root read-only.

use crate::errors::{LauncherError, Result};
use nix::mount::{MsFlags, mount};

/// Recursively mark `/` private so the remount below cannot propagate back
/// into the host mount namespace.
pub fn privatize_mount_tree() -> Result<()> {
    mount(
        None::<&str>,
        "/",
        None::<&str>,
        MsFlags::MS_PRIVATE | MsFlags::MS_REC,
        None::<&str>,
    )
    .map_err(|e| LauncherError::Syscall(format!("mount / private failed: {}", e)))
}

/// Bind-remount `/` read-only. On an unprivileged user namespace the kernel
/// may refuse; callers treat that as a soft failure since the rlimits and the
/// syscall filter still bound the child.
pub fn remount_root_readonly() -> Result<()> {
    mount(
        None::<&str>,
        "/",
        None::<&str>,
        MsFlags::MS_REMOUNT | MsFlags::MS_BIND | MsFlags::MS_RDONLY,
        None::<&str>,
    )
    .map_err(|e| LauncherError::Syscall(format!("mount / read-only failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Mount operations need a private mount namespace; outside one they must
    // fail with a descriptive error rather than touching the host tree.
    #[test]
    fn remount_outside_namespace_reports_syscall_error() {
        if nix::unistd::Uid::current().is_root() {
            return;
        }
        let err = remount_root_readonly().unwrap_err();
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn privatize_outside_namespace_reports_syscall_error() {
        if nix::unistd::Uid::current().is_root() {
            return;
        }
        let err = privatize_mount_tree().unwrap_err();
        assert!(err.to_string().contains("private"));
    }
}
