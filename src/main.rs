//! Cache Optimizer host process
//!
//! Serves a small cache over HTTP and runs the optimizer and alert monitor
//! against it in the background.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cache_optimizer::api::create_router;
use cache_optimizer::cache::{MemoryStore, Store, TimeoutStore};
use cache_optimizer::events::{BroadcastSink, EventSink, FanoutSink, TracingSink};
use cache_optimizer::{
    spawn_cleanup_task, spawn_monitor_task, spawn_optimizer_task, AppState, Config,
    OptimizerConfig,
};

/// Broadcast buffer for in-process event subscribers.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// # Startup Sequence
/// 1. Initialize tracing subscriber
/// 2. Load host config from environment and optimizer policy from JSON
/// 3. Create the store and wrap it with per-call deadlines
/// 4. Start cleanup, optimizer and monitor tasks
/// 5. Serve HTTP until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cache_optimizer=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Cache Optimizer");

    let config = Config::from_env();
    let policy = match &config.optimizer_config_path {
        Some(path) => OptimizerConfig::load(path)
            .with_context(|| format!("failed to load optimizer config from {}", path))?,
        None => OptimizerConfig::default(),
    };
    info!(
        port = config.server_port,
        optimize_interval = config.optimize_interval,
        store_timeout_ms = config.store_timeout_ms,
        patterns = policy.patterns.len(),
        alerts = policy.monitoring.alerts.len(),
        "Configuration loaded"
    );
    let policy = Arc::new(policy);

    let store = Arc::new(MemoryStore::new(policy.cache.clone()));
    let backend: Arc<dyn Store> = Arc::new(TimeoutStore::new(
        store.clone(),
        Duration::from_millis(config.store_timeout_ms),
    ));

    let broadcast = Arc::new(BroadcastSink::new(EVENT_CHANNEL_CAPACITY));
    let sink: Arc<dyn EventSink> = Arc::new(FanoutSink::new(vec![
        Arc::new(TracingSink) as Arc<dyn EventSink>,
        broadcast,
    ]));

    let state = AppState::new(store.clone(), backend, sink, policy.clone());

    let mut handles = vec![
        spawn_cleanup_task(store, config.cleanup_interval),
        spawn_optimizer_task(
            state.cycle.clone(),
            vec![state.region.clone()],
            config.optimize_interval,
        ),
    ];
    if policy.monitoring.enabled {
        handles.push(spawn_monitor_task(state.monitor.clone()));
    } else {
        info!("Monitoring disabled");
    }

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(handles))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM, then aborts the background tasks.
async fn shutdown_signal(handles: Vec<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    for handle in &handles {
        handle.abort();
    }
    warn!("Background tasks aborted");
}
