//! Alert Monitor
//!
//! Periodically samples stats, keeps a rolling history and raises
//! edge-triggered alerts when rules are breached.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::cache::{CacheStats, Metric, Store};
use crate::config::{AlertRule, MonitoringConfig, Region};
use crate::error::Result;
use crate::events::{AlertEvent, EventSink, OptimizerEvent};
use crate::optimizer::history::{default_retention, HistorySummary, StatsHistory, StatsSample};
use crate::optimizer::StatsCollector;

/// Per-rule state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertState {
    /// Not alerting; `breach_since` is set while a breach waits out its period
    Normal {
        breach_since: Option<DateTime<Utc>>,
    },
    Triggered,
}

impl Default for AlertState {
    fn default() -> Self {
        AlertState::Normal { breach_since: None }
    }
}

impl AlertState {
    /// Advances the state for one observation. Returns true on entry into Triggered.
    fn observe(&mut self, breached: bool, period: Duration, now: DateTime<Utc>) -> bool {
        match (*self, breached) {
            (_, false) => {
                *self = AlertState::default();
                false
            }
            (AlertState::Triggered, true) => false,
            (AlertState::Normal { breach_since }, true) => {
                let since = breach_since.unwrap_or(now);
                if now - since >= period {
                    *self = AlertState::Triggered;
                    true
                } else {
                    *self = AlertState::Normal {
                        breach_since: Some(since),
                    };
                    false
                }
            }
        }
    }
}

#[derive(Debug)]
struct MonitorState {
    rules: Vec<AlertState>,
    history: StatsHistory,
}

/// Outcome of a single monitoring tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub stats: CacheStats,
    pub alerts: Vec<AlertEvent>,
}

// == Alert Monitor ==
pub struct AlertMonitor {
    collector: StatsCollector,
    sink: Arc<dyn EventSink>,
    config: MonitoringConfig,
    region: Region,
    state: Mutex<MonitorState>,
}

impl AlertMonitor {
    pub fn new(
        store: Arc<dyn Store>,
        sink: Arc<dyn EventSink>,
        config: MonitoringConfig,
        region: Region,
    ) -> Self {
        Self::with_history(store, sink, config, region, StatsHistory::default())
    }

    pub fn with_history(
        store: Arc<dyn Store>,
        sink: Arc<dyn EventSink>,
        config: MonitoringConfig,
        region: Region,
        history: StatsHistory,
    ) -> Self {
        let rules = vec![AlertState::default(); config.alerts.len()];
        Self {
            collector: StatsCollector::new(store),
            sink,
            config,
            region,
            state: Mutex::new(MonitorState { rules, history }),
        }
    }

    /// History bounded by the default retention and `capacity` samples.
    pub fn with_capacity(
        store: Arc<dyn Store>,
        sink: Arc<dyn EventSink>,
        config: MonitoringConfig,
        region: Region,
        capacity: usize,
    ) -> Self {
        let history = StatsHistory::new(default_retention(), capacity);
        Self::with_history(store, sink, config, region, history)
    }

    pub fn config(&self) -> &MonitoringConfig {
        &self.config
    }

    pub async fn tick(&self) -> Result<TickReport> {
        self.tick_at(Utc::now()).await
    }

    /// Runs one monitoring tick as of `now`.
    ///
    /// A failed stats collection leaves rule states and history untouched.
    pub async fn tick_at(&self, now: DateTime<Utc>) -> Result<TickReport> {
        let stats = match self.collector.collect(&self.region).await {
            Ok(stats) => stats,
            Err(e) => {
                error!(
                    region = %self.region.name,
                    operation = "monitor",
                    error = %e,
                    "Monitoring tick failed"
                );
                return Err(e);
            }
        };

        let mut state = self.state.lock().await;
        state.history.record(now, stats);

        let mut alerts = Vec::new();
        for (rule, rule_state) in self.config.alerts.iter().zip(state.rules.iter_mut()) {
            let value = stats.metric(rule.metric);
            let breached = rule.operator.breached(value, rule.threshold);
            if rule_state.observe(breached, period_of(rule), now) {
                warn!(
                    region = %self.region.name,
                    metric = %rule.metric,
                    operator = rule.operator.symbol(),
                    value,
                    threshold = rule.threshold,
                    action = %rule.action,
                    "Alert triggered"
                );
                alerts.push(AlertEvent {
                    metric: rule.metric,
                    value,
                    threshold: rule.threshold,
                    timestamp: now,
                });
            }
        }
        drop(state);

        for alert in &alerts {
            self.sink.emit(OptimizerEvent::Alert(alert.clone()));
        }

        debug!(
            region = %self.region.name,
            hits = self.watched(Metric::Hits, stats.hits),
            misses = self.watched(Metric::Misses, stats.misses),
            memory = self.watched(Metric::Memory, stats.memory),
            evictions = self.watched(Metric::Evictions, stats.evictions),
            hit_rate = stats.hit_rate,
            alerts = alerts.len(),
            "Monitoring tick"
        );

        Ok(TickReport { stats, alerts })
    }

    fn watched(&self, metric: Metric, value: u64) -> Option<u64> {
        self.config.watches(metric).then_some(value)
    }

    /// Current state of each rule, in configuration order.
    pub async fn rule_states(&self) -> Vec<AlertState> {
        self.state.lock().await.rules.clone()
    }

    pub async fn history(&self) -> Vec<StatsSample> {
        self.state.lock().await.history.iter().cloned().collect()
    }

    pub async fn history_summary(&self) -> HistorySummary {
        self.state.lock().await.history.summary()
    }
}

fn period_of(rule: &AlertRule) -> Duration {
    let secs = i64::try_from(rule.period).unwrap_or(i64::MAX);
    Duration::seconds(secs.min(i64::MAX / 1000))
}
