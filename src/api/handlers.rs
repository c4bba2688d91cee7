//! API Handlers
//!
//! HTTP request handlers for the host surface: plain cache access plus
//! on-demand optimization and monitoring history.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::{CacheStats, MemoryStore, Store};
use crate::config::{OptimizerConfig, Region};
use crate::error::{OptimizerError, Result};
use crate::events::EventSink;
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, HistoryResponse, SetRequest, SetResponse,
    StatsResponse,
};
use crate::optimizer::{AlertMonitor, CacheOptimizationResult, OptimizationCycle};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Direct handle for client reads and writes
    pub store: Arc<MemoryStore>,
    pub cycle: Arc<OptimizationCycle>,
    pub monitor: Arc<AlertMonitor>,
    /// Region optimized by `POST /optimize`
    pub region: Region,
}

impl AppState {
    /// Wires the optimizer components against `backend`.
    ///
    /// `backend` is normally `store` wrapped in a `TimeoutStore`; client
    /// requests bypass it and hit `store` directly.
    pub fn new(
        store: Arc<MemoryStore>,
        backend: Arc<dyn Store>,
        sink: Arc<dyn EventSink>,
        policy: Arc<OptimizerConfig>,
    ) -> Self {
        let region = policy.default_region();
        let monitor = AlertMonitor::with_capacity(
            backend.clone(),
            sink.clone(),
            policy.monitoring.clone(),
            region.clone(),
            policy.settings.history_capacity,
        );
        let cycle = OptimizationCycle::new(backend, sink, policy);
        Self {
            store,
            cycle: Arc::new(cycle),
            monitor: Arc::new(monitor),
            region,
        }
    }
}

/// Handler for PUT /set
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    state.store.set(&req.key, req.value, req.ttl).await?;
    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.store.get(&key).await? {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(OptimizerError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if !state.store.delete(&key).await? {
        return Err(OptimizerError::NotFound(key));
    }
    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let stats = CacheStats::from_store(state.store.stats().await?);
    let entries = state.store.len().await;
    Ok(Json(StatsResponse::new(stats, entries)))
}

/// Handler for POST /optimize
///
/// Runs one cycle over the default region outside the regular schedule.
pub async fn optimize_handler(
    State(state): State<AppState>,
) -> Result<Json<CacheOptimizationResult>> {
    let result = state.cycle.run(&state.region).await?;
    Ok(Json(result))
}

/// Handler for GET /history
pub async fn history_handler(State(state): State<AppState>) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        summary: state.monitor.history_summary().await,
        samples: state.monitor.history().await,
    })
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
