//! Error types for launcher operations

use std::io;
use thiserror::Error;

/// Result type for launcher operations
pub type Result<T> = std::result::Result<T, LauncherError>;

/// Errors that can occur while establishing or supervising a sandboxed run
#[derive(Error, Debug)]
pub enum LauncherError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Syscall error: {0}")]
    Syscall(String),

    #[error("Namespace error: {0}")]
    Namespace(String),

    #[error("Seccomp error: {0}")]
    Seccomp(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Process monitoring error: {0}")]
    ProcessMonitoring(String),

    #[error("Telemetry error: {0}")]
    Telemetry(String),
}
