//! Rolling, time-indexed statistics history.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::cache::CacheStats;

/// Default retention window for history samples.
pub fn default_retention() -> Duration {
    Duration::hours(24)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSample {
    pub timestamp: DateTime<Utc>,
    pub stats: CacheStats,
}

/// Aggregate view over the retained samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    pub samples: usize,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
    pub average_hit_rate: f64,
    pub peak_memory: u64,
    pub latest: Option<CacheStats>,
}

/// Samples ordered by insertion, bounded by age and by count.
#[derive(Debug, Clone)]
pub struct StatsHistory {
    samples: VecDeque<StatsSample>,
    retention: Duration,
    capacity: usize,
}

impl StatsHistory {
    pub fn new(retention: Duration, capacity: usize) -> Self {
        Self {
            samples: VecDeque::new(),
            retention,
            capacity: capacity.max(1),
        }
    }

    /// Appends a sample and prunes everything outside the window.
    pub fn record(&mut self, timestamp: DateTime<Utc>, stats: CacheStats) {
        self.samples.push_back(StatsSample { timestamp, stats });
        self.prune(timestamp);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Drops samples older than the retention window relative to `now`.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.retention;
        self.samples.retain(|sample| sample.timestamp >= cutoff);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&StatsSample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatsSample> {
        self.samples.iter()
    }

    pub fn summary(&self) -> HistorySummary {
        let samples = self.samples.len();
        let average_hit_rate = if samples == 0 {
            0.0
        } else {
            self.samples.iter().map(|s| s.stats.hit_rate).sum::<f64>() / samples as f64
        };

        HistorySummary {
            samples,
            oldest: self.samples.front().map(|s| s.timestamp),
            newest: self.samples.back().map(|s| s.timestamp),
            average_hit_rate,
            peak_memory: self.samples.iter().map(|s| s.stats.memory).max().unwrap_or(0),
            latest: self.samples.back().map(|s| s.stats),
        }
    }
}

impl Default for StatsHistory {
    fn default() -> Self {
        Self::new(default_retention(), 10_000)
    }
}
