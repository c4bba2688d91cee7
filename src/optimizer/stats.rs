//! Point-in-time statistics collection.

use std::sync::Arc;

use tracing::error;

use crate::cache::{CacheStats, Store};
use crate::config::Region;
use crate::error::Result;

/// Reads raw counters from the store and derives `CacheStats`.
#[derive(Clone)]
pub struct StatsCollector {
    store: Arc<dyn Store>,
}

impl StatsCollector {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Collects a fresh snapshot. Never mutates the store.
    ///
    /// The store only reports global counters, so every region sees the same
    /// numbers; `region` scopes logging.
    pub async fn collect(&self, region: &Region) -> Result<CacheStats> {
        match self.store.stats().await {
            Ok(raw) => Ok(CacheStats::from_store(raw)),
            Err(e) => {
                error!(
                    region = %region.name,
                    operation = "collect_stats",
                    error = %e,
                    "Stats collection failed"
                );
                Err(e)
            }
        }
    }
}
