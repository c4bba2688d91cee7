//! Shared helpers for integration tests.
//!
//! `ScriptedStore` is a store whose sizes, counters and failures are set
//! by the test instead of derived from real traffic.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use cache_optimizer::cache::{
    current_timestamp_ms, glob_match, EntryMetadata, Store, StoreStats,
};
use cache_optimizer::error::{OptimizerError, Result};

pub const MB: u64 = 1024 * 1024;

// == Scripted Entry ==
#[derive(Debug, Clone)]
pub struct ScriptedEntry {
    pub value: String,
    pub size: u64,
    pub hits: u64,
    pub last_accessed: u64,
    pub created_at: u64,
    pub ttl: Option<u64>,
}

impl ScriptedEntry {
    /// An entry of `size` bytes created an hour ago, never read.
    pub fn sized(size: u64) -> Self {
        let now = current_timestamp_ms();
        Self {
            value: "v".to_string(),
            size,
            hits: 0,
            last_accessed: now - 3_600_000,
            created_at: now - 3_600_000,
            ttl: None,
        }
    }

    pub fn hits(mut self, hits: u64) -> Self {
        self.hits = hits;
        self
    }

    /// Last access `ms_ago` milliseconds before now.
    pub fn accessed(mut self, ms_ago: u64) -> Self {
        self.last_accessed = current_timestamp_ms() - ms_ago;
        self
    }

    /// Creation `ms_ago` milliseconds before now.
    pub fn created(mut self, ms_ago: u64) -> Self {
        self.created_at = current_timestamp_ms() - ms_ago;
        self
    }

    pub fn ttl(mut self, secs: u64) -> Self {
        self.ttl = Some(secs);
        self
    }
}

// == Scripted Store ==
#[derive(Default)]
pub struct ScriptedStore {
    entries: Mutex<BTreeMap<String, ScriptedEntry>>,
    counters: Mutex<(u64, u64)>,
    peak: Mutex<u64>,
    get_delay: Mutex<Duration>,
    unavailable: AtomicBool,
    failing: Mutex<HashSet<String>>,
    pinned: Mutex<HashSet<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    gets: AtomicUsize,
    sets: AtomicUsize,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, entry: ScriptedEntry) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.to_string(), entry);
        let used: u64 = entries.values().map(|e| e.size).sum();
        let mut peak = self.peak.lock().unwrap();
        *peak = (*peak).max(used);
    }

    /// Sets the raw hit and miss counters reported by `stats`.
    pub fn set_counters(&self, hits: u64, misses: u64) {
        *self.counters.lock().unwrap() = (hits, misses);
    }

    /// Every `get` sleeps this long while counted as in flight.
    pub fn set_get_delay(&self, delay: Duration) {
        *self.get_delay.lock().unwrap() = delay;
    }

    /// Makes every call fail with `StoreUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes `get` on `key` fail with `EntryLoadFailure`.
    pub fn fail_key(&self, key: &str) {
        self.failing.lock().unwrap().insert(key.to_string());
    }

    /// `delete` on `key` reports success but the entry stays, as if rewritten concurrently.
    pub fn pin_key(&self, key: &str) {
        self.pinned.lock().unwrap().insert(key.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn used(&self) -> u64 {
        self.entries.lock().unwrap().values().map(|e| e.size).sum()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn set_calls(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(OptimizerError::StoreUnavailable(
                "scripted outage".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for ScriptedStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check()?;
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(key) {
            return Err(OptimizerError::entry_load(key, "scripted failure"));
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let delay = *self.get_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(key)
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Option<u64>) -> Result<()> {
        self.check()?;
        self.sets.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.entries.lock().unwrap();
        let now = current_timestamp_ms();
        match entries.get_mut(key) {
            Some(entry) => {
                entry.value = value;
                entry.ttl = ttl;
                entry.last_accessed = now;
            }
            None => {
                let size = (key.len() + value.len()) as u64;
                entries.insert(
                    key.to_string(),
                    ScriptedEntry {
                        value,
                        size,
                        hits: 0,
                        last_accessed: now,
                        created_at: now,
                        ttl,
                    },
                );
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.check()?;
        if self.pinned.lock().unwrap().contains(key) {
            return Ok(true);
        }
        Ok(self.entries.lock().unwrap().remove(key).is_some())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.check()?;
        Ok(self
            .entries
            .lock()
            .unwrap()
            .keys()
            .filter(|k| glob_match(pattern, k))
            .cloned()
            .collect())
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>> {
        self.check()?;
        Ok(self.entries.lock().unwrap().get(key).and_then(|e| e.ttl))
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<bool> {
        self.check()?;
        match self.entries.lock().unwrap().get_mut(key) {
            Some(entry) => {
                entry.ttl = Some(seconds);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn stats(&self) -> Result<StoreStats> {
        self.check()?;
        let (hits, misses) = *self.counters.lock().unwrap();
        Ok(StoreStats {
            hits,
            misses,
            memory_used: self.used(),
            memory_peak: *self.peak.lock().unwrap(),
            evicted_keys: 0,
        })
    }

    async fn object(&self, key: &str) -> Result<Option<EntryMetadata>> {
        self.check()?;
        Ok(self.entries.lock().unwrap().get(key).map(|e| EntryMetadata {
            size: e.size,
            hits: e.hits,
            last_accessed: e.last_accessed,
            created_at: e.created_at,
        }))
    }
}
