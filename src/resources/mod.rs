//! Resource layer: per-process rlimit ceilings
//!
//! Hard caps via cgroup v2 are the business of whatever placed the supervisor
//! in a cgroup; this layer is the in-process defense that holds when no
//! cgroup is present.

pub mod rlimit;

pub use rlimit::RlimitPolicy;
