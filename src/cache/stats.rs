//! Cache Statistics Module
//!
//! Raw store counters and the derived point-in-time snapshot the optimizer acts on.

use serde::{Deserialize, Serialize};

// == Store Stats ==
/// Raw counters as reported by a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    /// Successful reads
    pub hits: u64,
    /// Reads of missing or expired keys
    pub misses: u64,
    /// Bytes currently accounted to live entries
    pub memory_used: u64,
    /// Highest `memory_used` ever observed
    pub memory_peak: u64,
    /// Entries removed by the store's own capacity policy
    pub evicted_keys: u64,
}

// == Cache Stats ==
/// Point-in-time cache statistics with derived hit rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// hits / (hits + misses), 0 when there were no reads
    pub hit_rate: f64,
    /// Bytes used
    pub size: u64,
    /// Peak bytes used
    pub memory: u64,
    pub evictions: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Derives a snapshot from raw store counters.
    pub fn from_store(raw: StoreStats) -> Self {
        Self {
            hits: raw.hits,
            misses: raw.misses,
            hit_rate: hit_rate(raw.hits, raw.misses),
            size: raw.memory_used,
            memory: raw.memory_peak,
            evictions: raw.evicted_keys,
        }
    }

    /// Reads a single metric as a float for threshold comparisons.
    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Hits => self.hits as f64,
            Metric::Misses => self.misses as f64,
            Metric::HitRate => self.hit_rate,
            Metric::Size => self.size as f64,
            Metric::Memory => self.memory as f64,
            Metric::Evictions => self.evictions as f64,
        }
    }
}

impl From<StoreStats> for CacheStats {
    fn from(raw: StoreStats) -> Self {
        Self::from_store(raw)
    }
}

// == Metric ==
/// A single watchable statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Hits,
    Misses,
    HitRate,
    Size,
    Memory,
    Evictions,
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Metric::Hits => "hits",
            Metric::Misses => "misses",
            Metric::HitRate => "hitRate",
            Metric::Size => "size",
            Metric::Memory => "memory",
            Metric::Evictions => "evictions",
        };
        f.write_str(name)
    }
}

// == Hit Rate ==
/// Returns hits / (hits + misses), or 0.0 if no reads have been made.
pub fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}
