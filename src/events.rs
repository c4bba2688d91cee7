//! Optimizer Events
//!
//! Structured events emitted by the optimizer and the sinks that receive them.
//! Delivery is fire-and-forget: sinks never report back to the emitter.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::cache::Metric;
use crate::optimizer::CacheOptimizationResult;

/// Event name for completed optimization cycles.
pub const OPTIMIZED_EVENT: &str = "cache.optimized";
/// Event name for threshold breaches.
pub const ALERT_EVENT: &str = "cache.alert";

// == Alert Event ==
/// Payload of a `cache.alert` event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    pub metric: Metric,
    pub value: f64,
    pub threshold: f64,
    pub timestamp: DateTime<Utc>,
}

// == Optimizer Event ==
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum OptimizerEvent {
    #[serde(rename = "cache.optimized")]
    Optimized(CacheOptimizationResult),
    #[serde(rename = "cache.alert")]
    Alert(AlertEvent),
}

impl OptimizerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OptimizerEvent::Optimized(_) => OPTIMIZED_EVENT,
            OptimizerEvent::Alert(_) => ALERT_EVENT,
        }
    }
}

// == Event Sink ==
/// Receiver of optimizer events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: OptimizerEvent);
}

/// Publishes events on a tokio broadcast channel.
///
/// Events emitted while nobody is subscribed are dropped.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<OptimizerEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OptimizerEvent> {
        self.tx.subscribe()
    }
}

impl EventSink for BroadcastSink {
    fn emit(&self, event: OptimizerEvent) {
        // Err only means there are no subscribers right now
        let _ = self.tx.send(event);
    }
}

/// Writes each event as a structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: OptimizerEvent) {
        match &event {
            OptimizerEvent::Optimized(result) => info!(
                event = event.name(),
                recommendations = result.recommendations.len(),
                memory_before = result.before.memory,
                memory_after = result.after.memory,
                hit_rate_before = result.before.hit_rate,
                hit_rate_after = result.after.hit_rate,
                "Cache optimized"
            ),
            OptimizerEvent::Alert(alert) => warn!(
                event = event.name(),
                metric = %alert.metric,
                value = alert.value,
                threshold = alert.threshold,
                "Cache alert"
            ),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<OptimizerEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<OptimizerEvent> {
        self.lock().clone()
    }

    pub fn alerts(&self) -> Vec<AlertEvent> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                OptimizerEvent::Alert(alert) => Some(alert.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn optimizations(&self) -> Vec<CacheOptimizationResult> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                OptimizerEvent::Optimized(result) => Some(result.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<OptimizerEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: OptimizerEvent) {
        self.lock().push(event);
    }
}

/// Forwards every event to several sinks in order.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }
}

impl EventSink for FanoutSink {
    fn emit(&self, event: OptimizerEvent) {
        for sink in &self.sinks {
            sink.emit(event.clone());
        }
    }
}
