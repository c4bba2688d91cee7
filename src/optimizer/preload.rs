//! Preload Engine
//!
//! Refreshes likely-hot entries in bounded-concurrency batches so they stay
//! resident and recently used.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::Store;
use crate::config::{OptimizerConfig, Region};
use crate::error::{OptimizerError, Result};
use crate::optimizer::EntryInspector;

/// How preload candidates are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreloadStrategy {
    /// Enumeration order
    All,
    /// Most hits first
    Popular,
    /// Most recently accessed first
    Recent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreloadConfig {
    pub patterns: Vec<String>,
    pub strategy: PreloadStrategy,
    /// Maximum number of keys to load
    pub limit: usize,
    /// Maximum simultaneous loads
    pub concurrency: usize,
    /// Deadline across the whole batch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Duration>,
}

impl PreloadConfig {
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(OptimizerError::ConfigInvalid(
                "preload limit must be greater than zero".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(OptimizerError::ConfigInvalid(
                "preload concurrency must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// == Preload Engine ==
#[derive(Clone)]
pub struct PreloadEngine {
    store: Arc<dyn Store>,
    inspector: EntryInspector,
    policy: Option<Arc<OptimizerConfig>>,
}

impl PreloadEngine {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            inspector: EntryInspector::new(store.clone()),
            store,
            policy: None,
        }
    }

    /// Resolves the refresh TTL per key through pattern overrides.
    pub fn with_policy(mut self, policy: Arc<OptimizerConfig>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Loads up to `config.limit` keys, at most `config.concurrency` at a time.
    ///
    /// Returns the keys that were rewritten. Per-key failures are logged and
    /// skipped; only candidate enumeration failures abort.
    pub async fn preload(&self, region: &Region, config: &PreloadConfig) -> Result<Vec<String>> {
        config.validate()?;

        let candidates = self.candidates(&config.patterns).await?;
        let ranked = self.rank(candidates, config.strategy).await?;
        let selected: Vec<String> = ranked.into_iter().take(config.limit).collect();

        let deadline = config.deadline.map(|d| tokio::time::Instant::now() + d);
        let mut loaded = Vec::new();
        let mut failed = 0usize;
        let mut batches = 0usize;

        for chunk in selected.chunks(config.concurrency) {
            // each load is bounded on its own so finished loads survive a deadline hit
            let results = join_all(chunk.iter().map(|key| async move {
                match deadline {
                    Some(at) => tokio::time::timeout_at(at, self.load(region, key))
                        .await
                        .ok(),
                    None => Some(self.load(region, key).await),
                }
            }))
            .await;
            batches += 1;

            let mut timed_out = false;
            for (key, result) in chunk.iter().zip(results) {
                match result {
                    Some(Ok(true)) => loaded.push(key.clone()),
                    Some(Ok(false)) => debug!(key = %key, "Preload candidate vanished"),
                    Some(Err(e)) => {
                        failed += 1;
                        warn!(
                            region = %region.name,
                            operation = "preload",
                            key = %key,
                            error = %e,
                            "Preload failed"
                        );
                    }
                    None => timed_out = true,
                }
            }

            if timed_out {
                warn!(
                    region = %region.name,
                    operation = "preload",
                    loaded = loaded.len(),
                    "Preload deadline reached, skipping remaining keys"
                );
                break;
            }
        }

        info!(
            region = %region.name,
            strategy = ?config.strategy,
            selected = selected.len(),
            loaded = loaded.len(),
            failed,
            batches,
            "Preload pass complete"
        );
        Ok(loaded)
    }

    /// Union of pattern matches in first-seen order.
    async fn candidates(&self, patterns: &[String]) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        for pattern in patterns {
            for key in self.store.keys(pattern).await? {
                if seen.insert(key.clone()) {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }

    async fn rank(&self, keys: Vec<String>, strategy: PreloadStrategy) -> Result<Vec<String>> {
        if strategy == PreloadStrategy::All {
            return Ok(keys);
        }

        let mut entries = self.inspector.inspect_all(&keys).await?;
        match strategy {
            PreloadStrategy::Popular => entries.sort_by(|a, b| b.hits.cmp(&a.hits)),
            PreloadStrategy::Recent => {
                entries.sort_by(|a, b| b.last_accessed.cmp(&a.last_accessed))
            }
            PreloadStrategy::All => {}
        }
        Ok(entries.into_iter().map(|e| e.key).collect())
    }

    /// Reads and rewrites one key. Ok(false) if it no longer exists.
    async fn load(&self, region: &Region, key: &str) -> Result<bool> {
        let Some(value) = self.store.get(key).await? else {
            return Ok(false);
        };
        let ttl = self
            .policy
            .as_ref()
            .map(|policy| policy.resolve(key))
            .unwrap_or(&region.config)
            .default_ttl();
        self.store.set(key, value, ttl).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::config::{CacheConfig, CachePattern};

    fn config(strategy: PreloadStrategy, limit: usize, concurrency: usize) -> PreloadConfig {
        PreloadConfig {
            patterns: vec!["user:*".to_string()],
            strategy,
            limit,
            concurrency,
            deadline: None,
        }
    }

    async fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new(CacheConfig::default()));
        for (key, reads) in [("user:a", 1), ("user:b", 5), ("user:c", 3), ("other:x", 9)] {
            store.set(key, "v".to_string(), None).await.unwrap();
            for _ in 0..reads {
                store.get(key).await.unwrap();
            }
        }
        store
    }

    fn region() -> Region {
        Region::new("default", "*", CacheConfig::default())
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let err = config(PreloadStrategy::All, 10, 0).validate().unwrap_err();
        assert!(matches!(err, OptimizerError::ConfigInvalid(_)));
        assert!(config(PreloadStrategy::All, 0, 1).validate().is_err());
    }

    #[tokio::test]
    async fn test_popular_ranks_by_hits() {
        let store = seeded_store().await;
        let loaded = PreloadEngine::new(store)
            .preload(&region(), &config(PreloadStrategy::Popular, 2, 2))
            .await
            .unwrap();

        assert_eq!(loaded, vec!["user:b", "user:c"]);
    }

    #[tokio::test]
    async fn test_all_keeps_enumeration_order_and_limit() {
        let store = seeded_store().await;
        let loaded = PreloadEngine::new(store)
            .preload(&region(), &config(PreloadStrategy::All, 2, 1))
            .await
            .unwrap();

        assert_eq!(loaded, vec!["user:a", "user:b"]);
    }

    #[tokio::test]
    async fn test_patterns_are_unioned_without_duplicates() {
        let store = seeded_store().await;
        let mut cfg = config(PreloadStrategy::All, 100, 3);
        cfg.patterns = vec!["user:*".to_string(), "user:b".to_string(), "other:*".to_string()];

        let loaded = PreloadEngine::new(store).preload(&region(), &cfg).await.unwrap();
        assert_eq!(loaded, vec!["user:a", "user:b", "user:c", "other:x"]);
    }

    #[tokio::test]
    async fn test_refresh_counts_as_access_and_resets_ttl() {
        let store = Arc::new(MemoryStore::new(CacheConfig::default()));
        store.set("user:a", "v".to_string(), Some(5)).await.unwrap();

        let mut policy = OptimizerConfig::default();
        policy.patterns.push(CachePattern {
            pattern: "user:*".to_string(),
            config: CacheConfig {
                max_age: 900,
                ..CacheConfig::default()
            },
        });

        PreloadEngine::new(store.clone())
            .with_policy(Arc::new(policy))
            .preload(&region(), &config(PreloadStrategy::Recent, 10, 1))
            .await
            .unwrap();

        assert_eq!(store.ttl("user:a").await.unwrap(), Some(900));
        assert_eq!(store.stats().await.unwrap().hits, 1);
    }
}
