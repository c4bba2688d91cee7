//! Eviction Engine
//!
//! Removes entries until the region's accounted size falls to a byte threshold.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::cache::{current_timestamp_ms, EntrySnapshot, Store};
use crate::config::Region;
use crate::error::Result;
use crate::optimizer::EntryInspector;

/// Order in which candidates are evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionStrategy {
    /// Least recently accessed first
    Lru,
    /// Fewest hits first
    Lfu,
    /// Soonest to expire first; persistent entries last
    Ttl,
    /// Fresh shuffle on every pass
    Random,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvictionConfig {
    pub strategy: EvictionStrategy,
    /// Target accounted bytes after the pass
    pub threshold: u64,
    /// Entries younger than this many seconds are protected
    #[serde(default)]
    pub min_age: u64,
}

// == Plan ==
/// Computes which entries to evict, in eviction order.
///
/// Unprotected entries are consumed in strategy order until the running
/// size reaches `threshold`. Only once all of them are gone do protected
/// entries (younger than `min_age`) become eligible, oldest creation first.
pub fn plan_eviction(
    entries: Vec<EntrySnapshot>,
    config: &EvictionConfig,
    now: u64,
) -> Vec<EntrySnapshot> {
    let mut current_size: u64 = entries.iter().map(|e| e.size).sum();
    if current_size <= config.threshold {
        return Vec::new();
    }

    let min_age_ms = config.min_age.saturating_mul(1000);
    let (mut protected, mut eligible): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .partition(|entry| entry.age_ms(now) < min_age_ms);

    order_by_strategy(&mut eligible, config.strategy);
    protected.sort_by_key(|entry| entry.created_at);

    let mut victims = Vec::new();
    for entry in eligible.into_iter().chain(protected) {
        if current_size <= config.threshold {
            break;
        }
        current_size = current_size.saturating_sub(entry.size);
        victims.push(entry);
    }
    victims
}

fn order_by_strategy(entries: &mut [EntrySnapshot], strategy: EvictionStrategy) {
    match strategy {
        EvictionStrategy::Lru => entries.sort_by_key(|e| e.last_accessed),
        EvictionStrategy::Lfu => entries.sort_by_key(|e| e.hits),
        EvictionStrategy::Ttl => entries.sort_by_key(|e| (e.expires_at.is_none(), e.expires_at)),
        EvictionStrategy::Random => fastrand::shuffle(entries),
    }
}

// == Eviction Engine ==
#[derive(Clone)]
pub struct EvictionEngine {
    store: Arc<dyn Store>,
    inspector: EntryInspector,
}

impl EvictionEngine {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            inspector: EntryInspector::new(store.clone()),
            store,
        }
    }

    /// Evicts entries of `region` per `config`; returns the evicted keys.
    ///
    /// Progress is measured against the sizes seen at enumeration time.
    /// Deletions are issued one at a time.
    pub async fn evict(&self, region: &Region, config: &EvictionConfig) -> Result<Vec<String>> {
        let keys = self.store.keys(&region.pattern).await?;
        let entries = self.inspector.inspect_all(&keys).await?;
        let victims = plan_eviction(entries, config, current_timestamp_ms());

        let mut evicted = Vec::with_capacity(victims.len());
        for victim in victims {
            match self.store.delete(&victim.key).await {
                Ok(existed) => {
                    if !existed {
                        debug!(region = %region.name, key = %victim.key, "Entry already gone");
                    }
                    evicted.push(victim.key);
                }
                Err(e) => {
                    error!(
                        region = %region.name,
                        operation = "evict",
                        evicted = evicted.len(),
                        error = %e,
                        "Eviction aborted"
                    );
                    return Err(e);
                }
            }
        }

        info!(
            region = %region.name,
            strategy = ?config.strategy,
            threshold = config.threshold,
            evicted = evicted.len(),
            "Eviction pass complete"
        );
        Ok(evicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::config::CacheConfig;

    const NOW: u64 = 10_000_000;

    fn entry(
        key: &str,
        size: u64,
        hits: u64,
        last_accessed: u64,
        created_at: u64,
    ) -> EntrySnapshot {
        EntrySnapshot {
            key: key.to_string(),
            size,
            hits,
            last_accessed,
            created_at,
            expires_at: None,
        }
    }

    fn keys(victims: &[EntrySnapshot]) -> Vec<&str> {
        victims.iter().map(|v| v.key.as_str()).collect()
    }

    fn config(strategy: EvictionStrategy, threshold: u64, min_age: u64) -> EvictionConfig {
        EvictionConfig {
            strategy,
            threshold,
            min_age,
        }
    }

    #[test]
    fn test_nothing_evicted_under_threshold() {
        let entries = vec![entry("a", 10, 0, 1, 0), entry("b", 10, 0, 2, 0)];
        let victims = plan_eviction(entries, &config(EvictionStrategy::Lru, 20, 0), NOW);
        assert!(victims.is_empty());
    }

    #[test]
    fn test_lru_evicts_oldest_access_first() {
        let entries = vec![
            entry("recent", 10, 0, 300, 0),
            entry("oldest", 10, 0, 100, 0),
            entry("middle", 10, 0, 200, 0),
        ];
        let victims = plan_eviction(entries, &config(EvictionStrategy::Lru, 15, 0), NOW);
        assert_eq!(keys(&victims), vec!["oldest", "middle"]);
    }

    #[test]
    fn test_lfu_evicts_fewest_hits_first() {
        let entries = vec![
            entry("hot", 10, 50, 0, 0),
            entry("cold", 10, 1, 0, 0),
            entry("warm", 10, 5, 0, 0),
        ];
        let victims = plan_eviction(entries, &config(EvictionStrategy::Lfu, 20, 0), NOW);
        assert_eq!(keys(&victims), vec!["cold"]);
    }

    #[test]
    fn test_ttl_evicts_soonest_expiry_first_and_persistent_last() {
        let mut persistent = entry("persistent", 10, 0, 0, 0);
        persistent.expires_at = None;
        let mut soon = entry("soon", 10, 0, 0, 0);
        soon.expires_at = Some(NOW + 1_000);
        let mut later = entry("later", 10, 0, 0, 0);
        later.expires_at = Some(NOW + 60_000);

        let victims = plan_eviction(
            vec![persistent, later, soon],
            &config(EvictionStrategy::Ttl, 5, 0),
            NOW,
        );
        assert_eq!(keys(&victims), vec!["soon", "later", "persistent"]);
    }

    #[test]
    fn test_random_reaches_threshold() {
        let entries: Vec<_> = (0..20)
            .map(|i| entry(&format!("k{}", i), 10, 0, i, 0))
            .collect();
        let victims = plan_eviction(entries, &config(EvictionStrategy::Random, 100, 0), NOW);
        assert_eq!(victims.len(), 10);
    }

    #[test]
    fn test_random_reshuffles_on_every_call() {
        let entries: Vec<_> = (0..24)
            .map(|i| entry(&format!("k{}", i), 10, 0, i, 0))
            .collect();
        let cfg = config(EvictionStrategy::Random, 0, 0);

        let orders: std::collections::HashSet<Vec<String>> = (0..8)
            .map(|_| {
                plan_eviction(entries.clone(), &cfg, NOW)
                    .into_iter()
                    .map(|v| v.key)
                    .collect()
            })
            .collect();

        assert!(orders.len() > 1, "random order was identical across calls");
    }

    #[test]
    fn test_protected_entries_skipped_while_others_remain() {
        // "young" was created 10s ago and is protected by a 300s min age
        let entries = vec![
            entry("young", 10, 0, 1, NOW - 10_000),
            entry("old-a", 10, 0, 5, NOW - 900_000),
            entry("old-b", 10, 0, 6, NOW - 900_000),
        ];
        let victims = plan_eviction(entries, &config(EvictionStrategy::Lru, 10, 300), NOW);
        assert_eq!(keys(&victims), vec!["old-a", "old-b"]);
    }

    #[test]
    fn test_protected_fallback_oldest_protected_first() {
        let entries = vec![
            entry("old", 10, 0, 9, NOW - 900_000),
            entry("young-newer", 10, 0, 1, NOW - 5_000),
            entry("young-older", 10, 0, 2, NOW - 60_000),
            entry("young-newest", 10, 0, 0, NOW - 1_000),
        ];
        let victims = plan_eviction(entries, &config(EvictionStrategy::Lru, 15, 300), NOW);
        assert_eq!(keys(&victims), vec!["old", "young-older", "young-newer"]);
    }

    #[tokio::test]
    async fn test_evict_deletes_from_store() {
        let store = Arc::new(MemoryStore::new(CacheConfig {
            max_size: 10_000,
            max_age: 0,
            ..CacheConfig::default()
        }));
        for i in 0..10 {
            // 2 + 8 = 10 bytes each
            store.set(&format!("k{}", i), "vvvvvvvv".to_string(), None).await.unwrap();
        }
        let region = Region::new("default", "*", store.config().clone());
        let engine = EvictionEngine::new(store.clone());

        let evicted = engine
            .evict(&region, &config(EvictionStrategy::Lfu, 50, 0))
            .await
            .unwrap();

        assert_eq!(evicted.len(), 5);
        assert_eq!(store.stats().await.unwrap().memory_used, 50);
        for key in evicted {
            assert!(store.object(&key).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_evict_only_touches_region_keys() {
        let store = Arc::new(MemoryStore::new(CacheConfig {
            max_size: 10_000,
            max_age: 0,
            ..CacheConfig::default()
        }));
        store.set("user:1", "x".repeat(100), None).await.unwrap();
        store.set("session:1", "x".repeat(100), None).await.unwrap();
        let region = Region::new("users", "user:*", store.config().clone());

        let evicted = EvictionEngine::new(store.clone())
            .evict(&region, &config(EvictionStrategy::Lru, 0, 0))
            .await
            .unwrap();

        assert_eq!(evicted, vec!["user:1"]);
        assert!(store.object("session:1").await.unwrap().is_some());
    }
}
