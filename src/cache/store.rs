//! Memory Store Module
//!
//! In-process key/value store with byte accounting, TTL expiration and
//! capacity eviction. Serves as the optimizer's default `Store`.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{
    current_timestamp_ms, glob_match, CacheEntry, EntryMetadata, Store, StoreStats,
    MAX_KEY_LENGTH,
};
use crate::config::{CacheConfig, CacheStrategy};
use crate::error::{OptimizerError, Result};

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
    memory_used: u64,
    memory_peak: u64,
    evictions: u64,
}

impl Inner {
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.memory_used = self.memory_used.saturating_sub(entry.size);
        Some(entry)
    }

    fn insert(&mut self, key: String, entry: CacheEntry) {
        self.memory_used += entry.size;
        if let Some(previous) = self.entries.insert(key, entry) {
            self.memory_used = self.memory_used.saturating_sub(previous.size);
        }
        self.memory_peak = self.memory_peak.max(self.memory_used);
    }

    /// Drops the entry if it has expired; returns true if it did.
    fn expire_if_due(&mut self, key: &str, now: u64) -> bool {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired_at(now));
        if expired {
            self.remove(key);
        }
        expired
    }

    /// Chooses the next capacity victim, never `keep`.
    fn victim(&self, strategy: CacheStrategy, keep: &str) -> Option<String> {
        let candidates = self.entries.iter().filter(|(k, _)| k.as_str() != keep);
        let victim = match strategy {
            CacheStrategy::Lru => candidates.min_by_key(|(_, e)| e.last_accessed),
            CacheStrategy::Lfu => candidates.min_by_key(|(_, e)| (e.hits, e.last_accessed)),
            CacheStrategy::Ttl => {
                candidates.min_by_key(|(_, e)| (e.expires_at.is_none(), e.expires_at))
            }
        };
        victim.map(|(k, _)| k.clone())
    }
}

// == Memory Store ==
/// In-memory `Store` guarded by an async read/write lock.
#[derive(Debug)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    config: CacheConfig,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store governed by `config`.
    ///
    /// `max_size` caps accounted bytes, `max_age` is the default TTL and
    /// `strategy` picks capacity victims.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Cleanup Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub async fn cleanup_expired(&self) -> usize {
        let now = current_timestamp_ms();
        let mut inner = self.inner.write().await;
        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            inner.remove(key);
        }
        expired.len()
    }

    /// Current number of entries, expired ones included until swept.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    fn validate_write(&self, key: &str, value: &str) -> Result<()> {
        if key.is_empty() {
            return Err(OptimizerError::InvalidRequest(
                "Key cannot be empty".to_string(),
            ));
        }
        if key.len() > MAX_KEY_LENGTH {
            return Err(OptimizerError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }
        if (key.len() + value.len()) as u64 > self.config.max_size {
            return Err(OptimizerError::InvalidRequest(format!(
                "Entry exceeds cache capacity of {} bytes",
                self.config.max_size
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = current_timestamp_ms();
        let mut inner = self.inner.write().await;
        inner.expire_if_due(key, now);

        let value = inner.entries.get_mut(key).map(|entry| {
            entry.touch(now);
            entry.value.clone()
        });
        match value {
            Some(_) => inner.hits += 1,
            None => inner.misses += 1,
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Option<u64>) -> Result<()> {
        self.validate_write(key, &value)?;

        let ttl = ttl.or_else(|| self.config.default_ttl());
        let mut inner = self.inner.write().await;

        // Overwrites keep creation time and hit count; the write itself counts as an access.
        let now = current_timestamp_ms();
        let mut entry = CacheEntry::new_at(key, value, ttl, now);
        if let Some(previous) = inner.entries.get(key) {
            if !previous.is_expired_at(now) {
                entry.created_at = previous.created_at;
                entry.hits = previous.hits;
            }
        }
        inner.insert(key.to_string(), entry);

        while inner.memory_used > self.config.max_size {
            let Some(victim) = inner.victim(self.config.strategy, key) else {
                break;
            };
            inner.remove(&victim);
            inner.evictions += 1;
            debug!(key = %victim, "Capacity eviction");
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.remove(key).is_some())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let now = current_timestamp_ms();
        let inner = self.inner.read().await;
        let mut keys: Vec<String> = inner
            .entries
            .iter()
            .filter(|(key, entry)| !entry.is_expired_at(now) && glob_match(pattern, key))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>> {
        let now = current_timestamp_ms();
        let inner = self.inner.read().await;
        Ok(inner
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
            .and_then(|entry| entry.ttl_remaining()))
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<bool> {
        let now = current_timestamp_ms();
        let mut inner = self.inner.write().await;
        if inner.expire_if_due(key, now) {
            return Ok(false);
        }
        match inner.entries.get_mut(key) {
            Some(entry) => {
                entry.expire_in(seconds);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn stats(&self) -> Result<StoreStats> {
        let inner = self.inner.read().await;
        Ok(StoreStats {
            hits: inner.hits,
            misses: inner.misses,
            memory_used: inner.memory_used,
            memory_peak: inner.memory_peak,
            evicted_keys: inner.evictions,
        })
    }

    async fn object(&self, key: &str) -> Result<Option<EntryMetadata>> {
        let now = current_timestamp_ms();
        let inner = self.inner.read().await;
        Ok(inner
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
            .map(CacheEntry::metadata))
    }
}
