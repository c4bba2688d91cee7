//! Optimizer Module
//!
//! Background components that observe a store and adjust it:
//! - `StatsCollector` / `EntryInspector`: read-only views of the store
//! - `EvictionEngine`: reclaims memory under pressure
//! - `PreloadEngine`: refreshes popular entries in bounded batches
//! - `TtlRebalancer`: floor-bumps short TTLs
//! - `OptimizationCycle`: decides which of the above to run
//! - `AlertMonitor`: edge-triggered threshold alerts with rolling history

mod cycle;
mod eviction;
mod history;
mod inspector;
mod monitor;
mod preload;
mod stats;
mod ttl;


pub use cycle::{
    CacheOptimizationResult, Impact, OptimizationCycle, Recommendation, RecommendationKind,
    EVICTION_TARGET_RATIO, HIT_RATE_FLOOR, MEMORY_PRESSURE_RATIO, PRELOAD_CONCURRENCY,
    PRELOAD_LIMIT, TTL_TARGET,
};
pub use eviction::{plan_eviction, EvictionConfig, EvictionEngine, EvictionStrategy};
pub use history::{default_retention, HistorySummary, StatsHistory, StatsSample};
pub use inspector::EntryInspector;
pub use monitor::{AlertMonitor, AlertState, TickReport};
pub use preload::{PreloadConfig, PreloadEngine, PreloadStrategy};
pub use stats::StatsCollector;
pub use ttl::{TtlRebalancer, DEFAULT_TTL_FLOOR};
