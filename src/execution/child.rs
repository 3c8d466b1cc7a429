//! Code path executed inside the freshly-cloned namespaces
//!
//! Order matters and is load-bearing: mount privatization, read-only root,
//! rlimits, seccomp filter, image replacement. The filter load strictly
//! precedes execv so no byte of untrusted code runs unfiltered.

use crate::execution::RunConfig;
use crate::isolation::{fs, seccomp};
use nix::unistd::{execv, getpid};
use std::ffi::CString;

/// Entry point of the cloned child.
///
/// The return value becomes the child's exit status if any fatal step fails
/// before execv; on success execv never returns.
pub fn child_main(config: RunConfig) -> isize {
    println!("[child] pid {} inside new namespaces", getpid());

    // Best-effort: on an unprivileged user namespace the kernel may refuse
    // either mount step. The rlimits and the filter still apply.
    if let Err(e) = fs::privatize_mount_tree() {
        eprintln!("[child] mount tree privatization failed (continuing): {}", e);
    }

    match fs::remount_root_readonly() {
        Ok(()) => println!("[child] root filesystem locked read-only"),
        Err(e) => eprintln!("[child] read-only remount failed (continuing): {}", e),
    }

    if let Err(e) = config.profile.rlimits().apply() {
        eprintln!("[child] failed to apply rlimits: {}", e);
        return 1;
    }

    if let Err(e) = seccomp::install(config.profile) {
        eprintln!("[child] failed to load seccomp filter: {}", e);
        return 1;
    }

    println!("[child] executing target: {}", config.program);

    let program = match CString::new(config.program.clone()) {
        Ok(s) => s,
        Err(_) => {
            eprintln!("[child] program path contains nul byte");
            return 1;
        }
    };

    let args_cstrings: Vec<CString> = config
        .args
        .iter()
        .map(|s| CString::new(s.clone()).unwrap_or_else(|_| CString::new("").unwrap()))
        .collect();

    let mut argv: Vec<&CString> = vec![&program];
    argv.extend(args_cstrings.iter());

    match execv(&program, &argv) {
        Ok(_) => 0,
        Err(e) => {
            eprintln!("[child] execv failed: {}", e);
            1
        }
    }
}
