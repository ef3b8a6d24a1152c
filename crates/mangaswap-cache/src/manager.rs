//! TTL cache over a persistent key-value store.
//!
//! Entries live under a reserved key prefix as JSON
//! `{data, timestamp, expires}`. Reads check expiry; writes trigger a
//! best-effort sweep that evicts the oldest entries past the capacity bound
//! and purges expired ones. Storage failures never reach the caller: they
//! are logged and read as misses.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::types::*;
use mangaswap_core::{CacheConfig, Clock, SystemClock};
use mangaswap_store::KeyValueStorage;

/// Namespaced, capacity-bounded TTL cache.
pub struct CacheManager {
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
}

impl CacheManager {
    /// Create a cache on the wall clock.
    pub fn new(storage: Arc<dyn KeyValueStorage>, config: CacheConfig) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock), config)
    }

    /// Create a cache reading time from `clock`.
    ///
    /// `max_entries` is raised to 1 if zero: the entry just written always
    /// survives its own sweep.
    pub fn with_clock(
        storage: Arc<dyn KeyValueStorage>,
        clock: Arc<dyn Clock>,
        mut config: CacheConfig,
    ) -> Self {
        if config.max_entries == 0 {
            warn!("Cache max_entries is 0, using 1");
            config.max_entries = 1;
        }
        Self {
            storage,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }

    /// Look up a value, reporting why a miss happened.
    pub fn lookup<T: DeserializeOwned>(&self, key: &str) -> CacheLookup<T> {
        let full_key = self.namespaced(key);
        let raw = match self.storage.get_item(&full_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return CacheLookup::Miss,
            Err(e) => {
                warn!("Cache read failed for {}: {}", key, e);
                return CacheLookup::Unavailable;
            }
        };

        let entry: CacheEntry<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Discarding malformed cache entry {}: {}", key, e);
                self.delete_quietly(&full_key);
                return CacheLookup::Corrupt;
            }
        };

        if entry.is_expired(self.clock.now_ms()) {
            debug!("Cache entry {} expired", key);
            self.delete_quietly(&full_key);
            return CacheLookup::Expired;
        }

        match serde_json::from_value(entry.data) {
            Ok(value) => CacheLookup::Hit(value),
            Err(e) => {
                warn!("Cache entry {} does not match the requested type: {}", key, e);
                CacheLookup::Corrupt
            }
        }
    }

    /// Get a cached value. `None` on miss, expiry, corruption or storage failure.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.lookup(key).into_option()
    }

    /// Store a value, then sweep.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, options: CacheOptions) {
        let now = self.clock.now_ms();
        let ttl_ms = options
            .ttl
            .map(|ttl| i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(self.config.default_ttl_ms);

        let entry = CacheEntry {
            data: value,
            timestamp: now,
            expires: now.saturating_add(ttl_ms),
        };
        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Cannot serialize cache value for {}: {}", key, e);
                return;
            }
        };

        let full_key = self.namespaced(key);
        if let Err(e) = self.storage.set_item(&full_key, &raw) {
            warn!("Cache write failed for {}: {}", key, e);
            return;
        }
        debug!("Cached {} (ttl={}ms)", key, ttl_ms);

        self.sweep(Some(&full_key));
    }

    /// Remove one entry. Removing an absent key is a no-op.
    pub fn remove(&self, key: &str) {
        if let Err(e) = self.storage.remove_item(&self.namespaced(key)) {
            warn!("Cache remove failed for {}: {}", key, e);
        }
    }

    /// Remove every entry under the cache prefix. Other keys are untouched.
    pub fn clear(&self) {
        let keys = self.namespaced_keys();
        if keys.is_empty() {
            return;
        }
        match self.storage.multi_remove(&keys) {
            Ok(()) => debug!("Cleared {} cache entries", keys.len()),
            Err(e) => warn!("Cache clear failed: {}", e),
        }
    }

    /// Keys currently held, without the prefix. Includes not-yet-swept
    /// expired entries.
    pub fn keys(&self) -> Vec<String> {
        let prefix = &self.config.key_prefix;
        self.namespaced_keys()
            .into_iter()
            .filter_map(|k| k.strip_prefix(prefix.as_str()).map(str::to_string))
            .collect()
    }

    /// Number of entries held, including not-yet-swept expired ones.
    pub fn len(&self) -> usize {
        self.namespaced_keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run the capacity and expiry sweep now.
    pub fn cleanup(&self) -> CleanupReport {
        self.sweep(None)
    }

    fn namespaced_keys(&self) -> Vec<String> {
        match self.storage.get_all_keys() {
            Ok(keys) => keys
                .into_iter()
                .filter(|k| k.starts_with(self.config.key_prefix.as_str()))
                .collect(),
            Err(e) => {
                warn!("Cannot list cache keys: {}", e);
                Vec::new()
            }
        }
    }

    fn read_meta(&self, full_key: &str) -> Option<EntryMeta> {
        match self.storage.get_item(full_key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).ok(),
            _ => None,
        }
    }

    fn delete_quietly(&self, full_key: &str) {
        if let Err(e) = self.storage.remove_item(full_key) {
            warn!("Failed to delete cache entry {}: {}", full_key, e);
        }
    }

    /// Stage 1 evicts the oldest surplus past `max_entries`; stage 2 drops
    /// expired and undecodable entries. `keep` is the key just written and
    /// is never evicted by its own sweep.
    fn sweep(&self, keep: Option<&str>) -> CleanupReport {
        let now = self.clock.now_ms();
        let mut entries: Vec<(String, Option<EntryMeta>)> = self
            .namespaced_keys()
            .into_iter()
            .map(|k| {
                let meta = self.read_meta(&k);
                (k, meta)
            })
            .collect();

        let mut report = CleanupReport {
            entries_scanned: entries.len(),
            ..Default::default()
        };

        // Stage 1: capacity
        let max = self.config.max_entries;
        if entries.len() > max {
            let surplus = entries.len() - max;
            let mut candidates: Vec<(i64, String)> = entries
                .iter()
                .filter(|(k, _)| Some(k.as_str()) != keep)
                .map(|(k, meta)| (meta.map(|m| m.timestamp).unwrap_or(i64::MIN), k.clone()))
                .collect();
            candidates.sort();

            let evicted: Vec<String> = candidates
                .into_iter()
                .take(surplus)
                .map(|(_, k)| k)
                .collect();
            match self.storage.multi_remove(&evicted) {
                Ok(()) => {
                    report.entries_evicted = evicted.len();
                    entries.retain(|(k, _)| !evicted.contains(k));
                }
                Err(e) => warn!("Cache eviction failed: {}", e),
            }
        }

        // Stage 2: expiry and corruption
        let mut expired = Vec::new();
        let mut corrupt = Vec::new();
        for (key, meta) in entries {
            match meta {
                Some(m) if now >= m.expires => expired.push(key),
                Some(_) => {}
                None => corrupt.push(key),
            }
        }
        let doomed: Vec<String> = expired.iter().chain(corrupt.iter()).cloned().collect();
        if !doomed.is_empty() {
            match self.storage.multi_remove(&doomed) {
                Ok(()) => {
                    report.entries_expired = expired.len();
                    report.corrupt_removed = corrupt.len();
                }
                Err(e) => warn!("Cache expiry sweep failed: {}", e),
            }
        }

        if report.removed() > 0 {
            debug!(
                "Cache sweep: scanned={}, evicted={}, expired={}, corrupt={}",
                report.entries_scanned,
                report.entries_evicted,
                report.entries_expired,
                report.corrupt_removed
            );
        }
        report
    }
}
