//! Seccomp BPF filter compilation and loading
//!
//! The filter is a whitelist: one allow rule per entry in the profile's
//! allow-list, and the mismatch action decides the fate of everything else.
//! Loading requires only `PR_SET_NO_NEW_PRIVS`, never root, and the filter
//! survives execve — which is why it is installed in the child immediately
//! before image replacement.

use crate::errors::{LauncherError, Result};
use crate::policy::{Profile, ViolationAction, syscall_table};
use seccompiler::{BpfProgram, SeccompAction, SeccompFilter, apply_filter};
use std::collections::BTreeMap;
use std::convert::TryInto;

/// Compile a profile's allow-list to BPF bytecode without loading it.
pub fn compile(profile: Profile) -> Result<BpfProgram> {
    build_program(profile.allowed_syscalls(), profile.violation_action())
}

fn build_program(allowed: &[&str], action: ViolationAction) -> Result<BpfProgram> {
    let mut rules: BTreeMap<i64, Vec<seccompiler::SeccompRule>> = BTreeMap::new();

    for syscall_name in allowed {
        match syscall_table::syscall_number(syscall_name) {
            Some(num) => {
                rules.entry(num).or_default();
            }
            None => {
                return Err(LauncherError::Seccomp(format!(
                    "Unknown syscall in allow-list: '{}'. This syscall is not supported on this architecture.",
                    syscall_name
                )));
            }
        }
    }

    let mismatch_action = match action {
        ViolationAction::Kill => SeccompAction::KillProcess,
        ViolationAction::Record => SeccompAction::Log,
    };

    let filter = SeccompFilter::new(
        rules,
        mismatch_action,
        SeccompAction::Allow,
        seccompiler::TargetArch::x86_64,
    )
    .map_err(|e| LauncherError::Seccomp(format!("Failed to create filter: {}", e)))?;

    let bpf_program: BpfProgram = filter
        .try_into()
        .map_err(|e| LauncherError::Seccomp(format!("Failed to compile filter: {}", e)))?;

    Ok(bpf_program)
}

/// Install the profile's filter into the current process.
///
/// Must be the last setup step before execve; nothing that needs a syscall
/// outside the allow-list can run in this process afterwards.
pub fn install(profile: Profile) -> Result<()> {
    unsafe {
        if libc::prctl(libc::PR_SET_NO_NEW_PRIVS, 1, 0, 0, 0) != 0 {
            return Err(LauncherError::Seccomp(format!(
                "Failed to set PR_SET_NO_NEW_PRIVS: {}",
                std::io::Error::last_os_error()
            )));
        }
    }

    let bpf_program = compile(profile)?;

    apply_filter(&bpf_program)
        .map_err(|e| LauncherError::Seccomp(format!("Failed to apply seccomp filter: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_strict_profile() {
        let program = compile(Profile::Strict).unwrap();
        assert!(!program.is_empty());
    }

    #[test]
    fn test_compile_resource_aware_profile() {
        assert!(compile(Profile::ResourceAware).is_ok());
    }

    #[test]
    fn test_compile_learning_profile() {
        assert!(compile(Profile::Learning).is_ok());
    }

    #[test]
    fn test_unknown_syscall_is_rejected() {
        let result = build_program(&["syscall_that_does_not_exist"], ViolationAction::Kill);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Unknown syscall"));
    }

    #[test]
    fn test_record_action_compiles() {
        let program = build_program(&["read", "write"], ViolationAction::Record).unwrap();
        assert!(!program.is_empty());
    }
}
