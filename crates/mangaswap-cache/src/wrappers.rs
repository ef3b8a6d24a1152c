//! Fixed-prefix, fixed-TTL shortcuts over `CacheManager::set`/`get`.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::manager::CacheManager;
use crate::types::CacheOptions;

pub const PROFILE_PREFIX: &str = "user_profile_";
pub const SEARCH_PREFIX: &str = "manga_search_";
pub const HISTORY_PREFIX: &str = "reading_history_";

pub const PROFILE_TTL: Duration = Duration::from_secs(10 * 60);
pub const SEARCH_TTL: Duration = Duration::from_secs(5 * 60);
pub const HISTORY_TTL: Duration = Duration::from_secs(30 * 60);

/// Search keys ignore case and surrounding whitespace.
pub fn search_key(query: &str) -> String {
    format!("{}{}", SEARCH_PREFIX, query.trim().to_lowercase())
}

impl CacheManager {
    pub fn cache_user_profile<T: Serialize + ?Sized>(&self, user_id: &str, profile: &T) {
        self.set(
            &format!("{}{}", PROFILE_PREFIX, user_id),
            profile,
            CacheOptions::with_ttl(PROFILE_TTL),
        );
    }

    pub fn cached_user_profile<T: DeserializeOwned>(&self, user_id: &str) -> Option<T> {
        self.get(&format!("{}{}", PROFILE_PREFIX, user_id))
    }

    pub fn cache_search_results<T: Serialize + ?Sized>(&self, query: &str, results: &T) {
        self.set(&search_key(query), results, CacheOptions::with_ttl(SEARCH_TTL));
    }

    pub fn cached_search_results<T: DeserializeOwned>(&self, query: &str) -> Option<T> {
        self.get(&search_key(query))
    }

    pub fn cache_reading_history<T: Serialize + ?Sized>(&self, user_id: &str, history: &T) {
        self.set(
            &format!("{}{}", HISTORY_PREFIX, user_id),
            history,
            CacheOptions::with_ttl(HISTORY_TTL),
        );
    }

    pub fn cached_reading_history<T: DeserializeOwned>(&self, user_id: &str) -> Option<T> {
        self.get(&format!("{}{}", HISTORY_PREFIX, user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use mangaswap_core::{CacheConfig, ManualClock};
    use mangaswap_store::MemoryStorage;

    fn test_cache() -> (CacheManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let cache = CacheManager::with_clock(
            Arc::new(MemoryStorage::new()),
            clock.clone(),
            CacheConfig::default(),
        );
        (cache, clock)
    }

    #[test]
    fn test_search_key_normalized() {
        assert_eq!(search_key("  One Piece "), "manga_search_one piece");
    }

    #[test]
    fn test_search_results_share_key_across_case() {
        let (cache, clock) = test_cache();
        cache.cache_search_results("Naruto", &vec!["m1", "m2"]);
        assert_eq!(
            cache.cached_search_results::<Vec<String>>(" naruto"),
            Some(vec!["m1".to_string(), "m2".to_string()])
        );

        clock.advance(SEARCH_TTL.as_millis() as i64);
        assert!(cache.cached_search_results::<Vec<String>>("naruto").is_none());
    }

    #[test]
    fn test_profile_and_history_ttls() {
        let (cache, clock) = test_cache();
        cache.cache_user_profile("u1", &serde_json::json!({"id": "u1"}));
        cache.cache_reading_history("u1", &vec![1, 2, 3]);
        assert_eq!(cache.keys().len(), 2);

        clock.advance(PROFILE_TTL.as_millis() as i64);
        assert!(cache.cached_user_profile::<serde_json::Value>("u1").is_none());
        assert_eq!(cache.cached_reading_history::<Vec<i32>>("u1"), Some(vec![1, 2, 3]));

        clock.advance((HISTORY_TTL - PROFILE_TTL).as_millis() as i64);
        assert!(cache.cached_reading_history::<Vec<i32>>("u1").is_none());
    }
}
