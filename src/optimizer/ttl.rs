//! TTL rebalancing: floor-bumps expirations that are too short.

use std::sync::Arc;

use tracing::info;

use crate::cache::Store;
use crate::config::Region;
use crate::error::Result;

/// Default minimum acceptable remaining TTL, in seconds.
pub const DEFAULT_TTL_FLOOR: u64 = 300;

#[derive(Clone)]
pub struct TtlRebalancer {
    store: Arc<dyn Store>,
    floor: u64,
}

impl TtlRebalancer {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            floor: DEFAULT_TTL_FLOOR,
        }
    }

    pub fn with_floor(mut self, floor: u64) -> Self {
        self.floor = floor;
        self
    }

    pub fn floor(&self) -> u64 {
        self.floor
    }

    /// Mean remaining TTL over keys that have one; None if none do.
    pub async fn mean_ttl(&self, region: &Region) -> Result<Option<f64>> {
        let keys = self.store.keys(&region.pattern).await?;
        let mut total = 0u64;
        let mut counted = 0u64;
        for key in &keys {
            if let Some(ttl) = self.store.ttl(key).await? {
                total += ttl;
                counted += 1;
            }
        }
        Ok((counted > 0).then(|| total as f64 / counted as f64))
    }

    /// True when the mean remaining TTL is below the floor.
    pub async fn should_rebalance(&self, region: &Region) -> Result<bool> {
        Ok(self
            .mean_ttl(region)
            .await?
            .is_some_and(|mean| mean < self.floor as f64))
    }

    /// Raises every TTL below the floor to `target`; never shortens one.
    ///
    /// Returns the keys whose TTL was changed.
    pub async fn rebalance(&self, region: &Region, target: u64) -> Result<Vec<String>> {
        let keys = self.store.keys(&region.pattern).await?;
        let mut bumped = Vec::new();
        for key in keys {
            let Some(ttl) = self.store.ttl(&key).await? else {
                continue;
            };
            if ttl < self.floor && ttl < target && self.store.expire(&key, target).await? {
                bumped.push(key);
            }
        }

        info!(
            region = %region.name,
            floor = self.floor,
            target,
            bumped = bumped.len(),
            "TTL rebalance complete"
        );
        Ok(bumped)
    }
}
