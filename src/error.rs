//! Error types for the cache optimizer
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Optimizer Error Enum ==
/// Unified error type for the optimizer and its host surface.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimizerError {
    /// The backing store could not be reached or did not answer in time.
    /// Aborts the current cycle or monitoring tick only.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A single key failed to load or inspect; callers skip it.
    #[error("Entry load failure for '{key}': {reason}")]
    EntryLoadFailure { key: String, reason: String },

    /// Malformed configuration rejected at load time
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Key not found in the store
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl OptimizerError {
    /// Convenience constructor for per-key failures.
    pub fn entry_load(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EntryLoadFailure {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for transport failures that must abort the current pass.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for OptimizerError {
    fn into_response(self) -> Response {
        let status = match &self {
            OptimizerError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            OptimizerError::EntryLoadFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            OptimizerError::ConfigInvalid(_) => StatusCode::BAD_REQUEST,
            OptimizerError::NotFound(_) => StatusCode::NOT_FOUND,
            OptimizerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the optimizer.
pub type Result<T> = std::result::Result<T, OptimizerError>;
