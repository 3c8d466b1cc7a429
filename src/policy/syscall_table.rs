//! Syscall name to number mapping (x86_64 Linux)
//!
//! Policy tables name syscalls; the kernel filter wants numbers. Resolving
//! through `libc::SYS_*` keeps the table in lockstep with the target libc.

/// Resolve a syscall name to its number on the build architecture.
/// Returns `None` for names this table does not know.
pub fn syscall_number(name: &str) -> Option<i64> {
    let num: libc::c_long = match name {
        // Process image and lifecycle
        "execve" => libc::SYS_execve,
        "exit" => libc::SYS_exit,
        "exit_group" => libc::SYS_exit_group,
        // Memory primitives
        "brk" => libc::SYS_brk,
        "mmap" => libc::SYS_mmap,
        "munmap" => libc::SYS_munmap,
        "mprotect" => libc::SYS_mprotect,
        // Per-architecture process control (glibc init)
        "arch_prctl" => libc::SYS_arch_prctl,
        // Byte-stream I/O
        "read" => libc::SYS_read,
        "write" => libc::SYS_write,
        "writev" => libc::SYS_writev,
        "lseek" => libc::SYS_lseek,
        "close" => libc::SYS_close,
        "fstat" => libc::SYS_fstat,
        // Path-relative open and link resolution
        "openat" => libc::SYS_openat,
        "readlink" => libc::SYS_readlink,
        // Entropy
        "getrandom" => libc::SYS_getrandom,
        // Self-observation (resource-aware profile)
        "getrusage" => libc::SYS_getrusage,
        "sysinfo" => libc::SYS_sysinfo,
        "clock_gettime" => libc::SYS_clock_gettime,
        "gettimeofday" => libc::SYS_gettimeofday,
        "nanosleep" => libc::SYS_nanosleep,
        "clock_nanosleep" => libc::SYS_clock_nanosleep,
        _ => return None,
    };
    Some(num as i64)
}
