//! Cache Module
//!
//! The store abstraction the optimizer works against, plus an in-memory
//! implementation with TTL expiration and capacity eviction.

mod entry;
mod glob;
mod stats;
mod store;
mod timeout;
mod traits;

// Re-export public types
pub use entry::{current_timestamp_ms, entry_size, expiry_at, CacheEntry, EntrySnapshot};
pub use glob::glob_match;
pub use stats::{hit_rate, CacheStats, Metric, StoreStats};
pub use store::MemoryStore;
pub use timeout::TimeoutStore;
pub use traits::{EntryMetadata, Store};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
