//! sandbox-launcher: isolated execution of untrusted binaries
//!
//! A single-host launcher that runs a native binary inside fresh Linux
//! namespaces under rlimit ceilings and a whitelist seccomp BPF filter,
//! samples its CPU and memory from /proc while it runs, and emits one JSON
//! post-mortem log per run.
//!
//! # Modules
//!
//! - **policy**: per-profile allow-lists, rlimit vectors, namespace masks
//! - **isolation**: namespaces, mount surgery, seccomp filtering
//! - **resources**: setrlimit ceilings
//! - **execution**: supervisor state machine and child runner
//! - **monitoring**: /proc usage sampling
//! - **telemetry**: sample buffer and log emission
//! - **capabilities**: host facility probing
//!
//! # Example
//!
//! ```ignore
//! use sandbox_launcher::{Profile, RunConfig, Supervisor};
//!
//! let config = RunConfig {
//!     program: "/usr/local/bin/cpu_hog".to_string(),
//!     args: vec![],
//!     profile: Profile::Strict,
//! };
//! let outcome = Supervisor::new(config).run()?;
//! println!("exit reason: {}", outcome.reason);
//! ```

// Core modules
pub mod capabilities;
pub mod errors;
pub mod logging;

// Layered modules
pub mod execution;
pub mod isolation;
pub mod monitoring;
pub mod policy;
pub mod resources;
pub mod telemetry;

// Public API
pub use capabilities::SystemCapabilities;
pub use errors::{LauncherError, Result};
pub use execution::{ExitReason, RunConfig, RunOutcome, Supervisor};
pub use isolation::NamespaceConfig;
pub use policy::Profile;
pub use telemetry::{RunLog, Summary, TelemetryRecorder, Timeline};
