//! Monitoring layer: process usage sampling via /proc

pub mod proc;

pub use proc::{ProcUsage, clock_ticks_per_second};
