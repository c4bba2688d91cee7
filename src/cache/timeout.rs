//! Deadline wrapper turning slow store calls into `StoreUnavailable`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::{EntryMetadata, Store, StoreStats};
use crate::error::{OptimizerError, Result};

/// Wraps a store and bounds every call by a fixed deadline.
pub struct TimeoutStore {
    inner: Arc<dyn Store>,
    deadline: Duration,
}

impl TimeoutStore {
    pub fn new(inner: Arc<dyn Store>, deadline: Duration) -> Self {
        Self { inner, deadline }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T>> + Send,
    ) -> Result<T> {
        match tokio::time::timeout(self.deadline, call).await {
            Ok(result) => result,
            Err(_) => Err(OptimizerError::StoreUnavailable(format!(
                "{} timed out after {}ms",
                operation,
                self.deadline.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl Store for TimeoutStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.bounded("get", self.inner.get(key)).await
    }

    async fn set(&self, key: &str, value: String, ttl: Option<u64>) -> Result<()> {
        self.bounded("set", self.inner.set(key, value, ttl)).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.bounded("delete", self.inner.delete(key)).await
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.bounded("keys", self.inner.keys(pattern)).await
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>> {
        self.bounded("ttl", self.inner.ttl(key)).await
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<bool> {
        self.bounded("expire", self.inner.expire(key, seconds)).await
    }

    async fn stats(&self) -> Result<StoreStats> {
        self.bounded("stats", self.inner.stats()).await
    }

    async fn object(&self, key: &str) -> Result<Option<EntryMetadata>> {
        self.bounded("object", self.inner.object(key)).await
    }
}
