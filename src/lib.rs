//! Cache Optimizer - adaptive tuning for a key-value cache
//!
//! Watches a store's hit rate, memory and TTL distribution, and runs
//! eviction, preload and TTL rebalancing passes when thresholds are crossed.
//! Threshold rules raise edge-triggered alerts over a rolling stats history.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod optimizer;
pub mod tasks;

pub use api::AppState;
pub use config::{Config, OptimizerConfig};
pub use error::{OptimizerError, Result};
pub use tasks::{spawn_cleanup_task, spawn_monitor_task, spawn_optimizer_task};
