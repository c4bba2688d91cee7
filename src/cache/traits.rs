//! Store abstraction consumed by the optimizer.

use async_trait::async_trait;
use serde::Serialize;

use crate::cache::StoreStats;
use crate::error::Result;

/// Per-key metadata, read without counting as an access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryMetadata {
    pub size: u64,
    pub hits: u64,
    pub last_accessed: u64,
    pub created_at: u64,
}

/// Generic key/value store the optimizer operates on.
///
/// Implementations must tolerate concurrent callers. Transport failures are
/// reported as `OptimizerError::StoreUnavailable`.
#[async_trait]
pub trait Store: Send + Sync {
    /// Reads a value; counts as an access.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes a value. `ttl` in seconds; None applies the store default.
    async fn set(&self, key: &str, value: String, ttl: Option<u64>) -> Result<()>;

    /// Removes a key. Returns false if it was already gone.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Lists live keys matching a glob pattern.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Remaining TTL in seconds; None for missing or persistent keys.
    async fn ttl(&self, key: &str) -> Result<Option<u64>>;

    /// Sets a new TTL in seconds. Returns false if the key does not exist.
    async fn expire(&self, key: &str, seconds: u64) -> Result<bool>;

    /// Raw counters.
    async fn stats(&self) -> Result<StoreStats>;

    /// Size and access metadata; None for missing keys.
    async fn object(&self, key: &str) -> Result<Option<EntryMetadata>>;
}
