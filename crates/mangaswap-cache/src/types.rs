//! Cache types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A cache entry as persisted in the key-value store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    /// Creation time, ms since epoch. Eviction orders by this.
    pub timestamp: i64,
    /// Expiry time, ms since epoch.
    pub expires: i64,
}

impl<T> CacheEntry<T> {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires
    }
}

/// Header of a stored entry, without its payload.
#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct EntryMeta {
    pub timestamp: i64,
    pub expires: i64,
}

/// Options for `CacheManager::set`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheOptions {
    /// Time to live. `None` uses the configured default.
    pub ttl: Option<Duration>,
}

impl CacheOptions {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl: Some(ttl) }
    }
}

/// Outcome of a cache read.
///
/// Every variant other than `Hit` is a miss for the caller; the distinction
/// exists so hosts and tests can tell why.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    Hit(T),
    /// No entry under the key.
    Miss,
    /// The entry had expired and was removed.
    Expired,
    /// The stored value could not be decoded.
    Corrupt,
    /// The storage layer failed.
    Unavailable,
}

impl<T> CacheLookup<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Hit(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

/// What a cleanup sweep removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    #[serde(rename = "entriesScanned")]
    pub entries_scanned: usize,
    #[serde(rename = "entriesEvicted")]
    pub entries_evicted: usize,
    #[serde(rename = "entriesExpired")]
    pub entries_expired: usize,
    #[serde(rename = "corruptRemoved")]
    pub corrupt_removed: usize,
}

impl CleanupReport {
    pub fn removed(&self) -> usize {
        self.entries_evicted + self.entries_expired + self.corrupt_removed
    }
}
