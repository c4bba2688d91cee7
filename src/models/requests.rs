//! Request DTOs

use serde::Deserialize;

/// Request body for `PUT /set`.
///
/// Key validation happens in the store so that every writer sees the same rules.
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    pub key: String,
    pub value: String,
    /// TTL in seconds; falls back to the store's `maxAge` when absent
    #[serde(default)]
    pub ttl: Option<u64>,
}
