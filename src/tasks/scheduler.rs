//! Interval-driven optimizer and monitor tasks.
//!
//! A failed cycle or tick is logged and the loop carries on with the next
//! interval; only `abort()` on the returned handle stops it.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::config::Region;
use crate::optimizer::{AlertMonitor, OptimizationCycle};

/// Spawns a task running one optimization cycle per region every `interval_secs`.
///
/// The first cycle runs one full interval after start.
pub fn spawn_optimizer_task(
    cycle: Arc<OptimizationCycle>,
    regions: Vec<Region>,
    interval_secs: u64,
) -> JoinHandle<()> {
    let period = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            regions = regions.len(),
            "Starting optimizer task with interval of {} seconds",
            period.as_secs()
        );

        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            for region in &regions {
                // errors are logged inside run(); the next interval proceeds normally
                let _ = cycle.run(region).await;
            }
        }
    })
}

/// Spawns the alert monitor loop on its configured interval.
pub fn spawn_monitor_task(monitor: Arc<AlertMonitor>) -> JoinHandle<()> {
    let period = Duration::from_secs(monitor.config().interval.max(1));

    tokio::spawn(async move {
        info!(
            rules = monitor.config().alerts.len(),
            "Starting alert monitor with interval of {} seconds",
            period.as_secs()
        );

        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let _ = monitor.tick().await;
        }
    })
}
