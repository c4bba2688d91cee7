//! Cache Entry Module
//!
//! Defines stored entries with access metadata and TTL support.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::cache::EntryMetadata;

// == Cache Entry ==
/// A single stored value together with the metadata the optimizer ranks on.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// The stored value
    pub value: String,
    /// Accounted size in bytes (key + value)
    pub size: u64,
    /// Read count since creation
    pub hits: u64,
    /// Last read or write (Unix milliseconds)
    pub last_accessed: u64,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry for `key` with optional TTL in seconds.
    pub fn new(key: &str, value: String, ttl_seconds: Option<u64>) -> Self {
        Self::new_at(key, value, ttl_seconds, current_timestamp_ms())
    }

    /// Creates a new entry as if written at `now` (Unix milliseconds).
    pub fn new_at(key: &str, value: String, ttl_seconds: Option<u64>, now: u64) -> Self {
        let size = entry_size(key, &value);
        Self {
            value,
            size,
            hits: 0,
            last_accessed: now,
            created_at: now,
            expires_at: ttl_seconds.map(|ttl| expiry_at(now, ttl)),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its expiration time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    pub fn is_expired_at(&self, now: u64) -> bool {
        matches!(self.expires_at, Some(expires) if now >= expires)
    }

    // == Touch ==
    /// Records a read: bumps the hit counter and access time.
    pub fn touch(&mut self, now: u64) {
        self.hits += 1;
        self.last_accessed = now;
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        let now = current_timestamp_ms();
        self.expires_at.map(|expires| expires.saturating_sub(now))
    }

    /// Returns remaining TTL in seconds (rounded up), or None if no expiration is set.
    pub fn ttl_remaining(&self) -> Option<u64> {
        self.ttl_remaining_ms().map(|ms| ms.div_ceil(1000))
    }

    /// Sets a new TTL counted from now.
    pub fn expire_in(&mut self, seconds: u64) {
        self.expires_at = Some(expiry_at(current_timestamp_ms(), seconds));
    }

    /// Snapshot of the metadata exposed through `Store::object`.
    pub fn metadata(&self) -> EntryMetadata {
        EntryMetadata {
            size: self.size,
            hits: self.hits,
            last_accessed: self.last_accessed,
            created_at: self.created_at,
        }
    }
}

// == Entry Snapshot ==
/// Read-only view of an entry as seen by the optimizer.
///
/// Does not carry the value: resolving it through `get` would count as an
/// access and disturb the very recency the snapshot is ranked by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySnapshot {
    pub key: String,
    pub size: u64,
    pub hits: u64,
    pub last_accessed: u64,
    pub created_at: u64,
    pub expires_at: Option<u64>,
}

impl EntrySnapshot {
    /// Age in milliseconds relative to `now`.
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.created_at)
    }
}

// == Utility Functions ==
/// Accounted size of an entry in bytes.
pub fn entry_size(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}

/// Expiry time in Unix milliseconds for a TTL of `ttl_seconds` starting at `now`.
///
/// Saturates at `u64::MAX`, which reads as "never" in practice.
pub fn expiry_at(now: u64, ttl_seconds: u64) -> u64 {
    now.saturating_add(ttl_seconds.saturating_mul(1000))
}

/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = CacheEntry::new("k", "test_value".to_string(), None);

        assert_eq!(entry.value, "test_value");
        assert_eq!(entry.size, 11);
        assert_eq!(entry.hits, 0);
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_creation_with_ttl() {
        let entry = CacheEntry::new_at("k", "v".to_string(), Some(60), 1_000);

        assert_eq!(entry.expires_at, Some(61_000));
        assert!(!entry.is_expired_at(60_999));
        assert!(entry.is_expired_at(61_000));
    }

    #[test]
    fn test_touch_updates_hits_and_access_time() {
        let mut entry = CacheEntry::new_at("k", "v".to_string(), None, 1_000);
        entry.touch(5_000);
        entry.touch(7_000);

        assert_eq!(entry.hits, 2);
        assert_eq!(entry.last_accessed, 7_000);
        assert_eq!(entry.created_at, 1_000);
    }

    #[test]
    fn test_ttl_remaining_seconds() {
        let entry = CacheEntry::new("k", "v".to_string(), Some(10));

        let remaining = entry.ttl_remaining().unwrap();
        assert!(remaining <= 10);
        assert!(remaining >= 9);
    }

    #[test]
    fn test_huge_ttl_saturates_instead_of_overflowing() {
        let entry = CacheEntry::new_at("k", "v".to_string(), Some(u64::MAX), 1_000);
        assert_eq!(entry.expires_at, Some(u64::MAX));
        assert!(!entry.is_expired_at(current_timestamp_ms()));

        let mut entry = CacheEntry::new("k", "v".to_string(), None);
        entry.expire_in(u64::MAX / 100);
        assert_eq!(entry.expires_at, Some(u64::MAX));
        assert_eq!(expiry_at(1_000, 2), 3_000);
    }

    #[test]
    fn test_ttl_remaining_expired_is_zero() {
        let entry = CacheEntry::new_at("k", "v".to_string(), Some(1), 0);
        assert_eq!(entry.ttl_remaining_ms(), Some(0));
    }

    #[test]
    fn test_expire_in_extends_ttl() {
        let mut entry = CacheEntry::new("k", "v".to_string(), Some(5));
        entry.expire_in(300);

        let remaining = entry.ttl_remaining().unwrap();
        assert!(remaining >= 299);
    }

    #[test]
    fn test_snapshot_age() {
        let snapshot = EntrySnapshot {
            key: "k".to_string(),
            size: 1,
            hits: 0,
            last_accessed: 0,
            created_at: 1_000,
            expires_at: None,
        };
        assert_eq!(snapshot.age_ms(4_000), 3_000);
        assert_eq!(snapshot.age_ms(500), 0);
    }
}
