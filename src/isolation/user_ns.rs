//! User namespace UID/GID mapping support
//!
//! A freshly-created user namespace has no mappings; until the parent writes
//! /proc/{pid}/uid_map and gid_map, the child sees itself as the overflow
//! uid and lacks the in-namespace capabilities the mount steps rely on.

use crate::errors::{LauncherError, Result};
use nix::unistd::Pid;
use std::fs;

/// Map the invoking user's UID/GID to root (0) inside the child's namespace.
///
/// Must run in the parent after clone and before the child proceeds with
/// setup; setgroups is denied first, as the kernel requires for an
/// unprivileged gid_map write.
pub fn setup_user_namespace(child_pid: Pid, uid: u32, gid: u32) -> Result<()> {
    let pid = child_pid.as_raw();

    let uid_map = format!("0 {} 1\n", uid);
    fs::write(format!("/proc/{}/uid_map", pid), &uid_map).map_err(|e| {
        LauncherError::Namespace(format!("Failed to write uid_map for pid {}: {}", pid, e))
    })?;

    fs::write(format!("/proc/{}/setgroups", pid), "deny\n").map_err(|e| {
        LauncherError::Namespace(format!("Failed to write setgroups for pid {}: {}", pid, e))
    })?;

    let gid_map = format!("0 {} 1\n", gid);
    fs::write(format!("/proc/{}/gid_map", pid), &gid_map).map_err(|e| {
        LauncherError::Namespace(format!("Failed to write gid_map for pid {}: {}", pid, e))
    })?;

    Ok(())
}
