//! Per-key metadata resolution shared by eviction and preload ranking.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{current_timestamp_ms, expiry_at, EntrySnapshot, Store};
use crate::error::{OptimizerError, Result};

#[derive(Clone)]
pub struct EntryInspector {
    store: Arc<dyn Store>,
}

impl EntryInspector {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Resolves size, hits, access times and expiry for `key`.
    ///
    /// Returns `EntryLoadFailure` if the key disappeared in the meantime.
    pub async fn inspect(&self, key: &str) -> Result<EntrySnapshot> {
        let meta = self
            .store
            .object(key)
            .await?
            .ok_or_else(|| OptimizerError::entry_load(key, "key no longer exists"))?;
        let ttl = self.store.ttl(key).await?;
        let expires_at = ttl.map(|secs| expiry_at(current_timestamp_ms(), secs));

        Ok(EntrySnapshot {
            key: key.to_string(),
            size: meta.size,
            hits: meta.hits,
            last_accessed: meta.last_accessed,
            created_at: meta.created_at,
            expires_at,
        })
    }

    /// Inspects every key in order, skipping the ones that fail individually.
    ///
    /// `StoreUnavailable` aborts the whole pass.
    pub async fn inspect_all(&self, keys: &[String]) -> Result<Vec<EntrySnapshot>> {
        let mut snapshots = Vec::with_capacity(keys.len());
        for key in keys {
            match self.inspect(key).await {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) if e.is_store_unavailable() => return Err(e),
                Err(e @ OptimizerError::EntryLoadFailure { .. }) => {
                    debug!(key = %key, error = %e, "Skipping entry");
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Entry inspection failed, skipping");
                }
            }
        }
        Ok(snapshots)
    }
}
