//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the host is up.
//!
//! # Tasks
//! - TTL Cleanup: Sweeps expired entries from the memory store
//! - Optimizer: Runs an optimization cycle per region
//! - Monitor: Samples stats and raises alerts

mod cleanup;
mod scheduler;

pub use cleanup::spawn_cleanup_task;
pub use scheduler::{spawn_monitor_task, spawn_optimizer_task};
