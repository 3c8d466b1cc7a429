//! Isolation layer: namespaces, mount surgery, seccomp filtering
//!
//! Everything here runs unprivileged. The namespace mask is applied at clone
//! time by the supervisor; the mount and seccomp steps run inside the child,
//! in a fixed order, before the target image replaces the process.

pub mod fs;
pub mod namespace;
pub mod seccomp;
pub mod user_ns;

pub use namespace::NamespaceConfig;
