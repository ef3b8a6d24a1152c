//! Composition root: owns the cache and the recommendation engine.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use mangaswap_cache::CacheManager;
use mangaswap_core::{AppConfig, Clock, DataPaths, Result, SystemClock};
use mangaswap_recommend::{
    Catalog, ExchangeMatch, Manga, ReadingEntry, RecommendationEngine, RecommendationScore,
    UserProfile,
};
use mangaswap_store::{KeyValueStorage, MemoryStorage, SqliteStorage};

/// Application services, constructed once by the host and passed around.
pub struct MangaSwap {
    config: AppConfig,
    cache: Arc<CacheManager>,
    engine: RecommendationEngine,
}

impl MangaSwap {
    /// Open services rooted at `data_dir`: config from `config.json`,
    /// catalog from `catalog.json` (empty if absent), cache in SQLite.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let paths = DataPaths::new(data_dir)?;
        info!("Data directory: {}", paths.root.display());

        let config = AppConfig::load(&paths.config_file)?;
        let storage = Arc::new(SqliteStorage::open(&paths.storage)?);
        let catalog = if paths.catalog_file.exists() {
            Catalog::load(&paths.catalog_file)?
        } else {
            info!("No catalog at {}, starting empty", paths.catalog_file.display());
            Catalog::new()
        };

        Ok(Self::with_parts(config, storage, Arc::new(SystemClock), catalog))
    }

    /// Services on a volatile store.
    pub fn in_memory(config: AppConfig, catalog: Catalog) -> Self {
        Self::with_parts(
            config,
            Arc::new(MemoryStorage::new()),
            Arc::new(SystemClock),
            catalog,
        )
    }

    pub fn with_parts(
        mut config: AppConfig,
        storage: Arc<dyn KeyValueStorage>,
        clock: Arc<dyn Clock>,
        catalog: Catalog,
    ) -> Self {
        let cache = Arc::new(CacheManager::with_clock(storage, clock, config.cache.clone()));
        config.cache = cache.config().clone();
        let engine = RecommendationEngine::new(catalog, config.recommend.clone());
        Self {
            config,
            cache,
            engine,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache(&self) -> Arc<CacheManager> {
        self.cache.clone()
    }

    pub fn engine(&self) -> &RecommendationEngine {
        &self.engine
    }

    /// Catalog search memoised through the search cache.
    pub fn search(&self, query: &str) -> Vec<Manga> {
        if let Some(ids) = self.cache.cached_search_results::<Vec<String>>(query) {
            debug!("Search cache hit: {:?}", query);
            return self
                .engine
                .with_catalog(|c| ids.iter().filter_map(|id| c.get(id).cloned()).collect());
        }

        let results: Vec<Manga> = self
            .engine
            .with_catalog(|c| c.search(query).into_iter().cloned().collect());
        let ids: Vec<&str> = results.iter().map(|m| m.id.as_str()).collect();
        self.cache.cache_search_results(query, &ids);
        results
    }

    /// Search on behalf of a user, recording the query on their profile.
    pub fn search_as(&self, user_id: &str, query: &str) -> Result<Vec<Manga>> {
        self.load_profile(user_id);
        self.engine.record_search(user_id, query)?;
        if let Some(profile) = self.engine.profile(user_id) {
            self.cache.cache_user_profile(user_id, &profile);
        }
        Ok(self.search(query))
    }

    /// Store a profile in the engine and refresh its cached copies.
    /// A profile the engine rejects leaves the cache untouched.
    pub fn save_profile(&self, profile: UserProfile) -> Result<()> {
        self.engine.upsert_profile(profile.clone())?;
        self.refresh_cached_profile(&profile);
        Ok(())
    }

    /// Apply `f` to a stored profile (restoring it from cache first if
    /// needed), then refresh its cached copies.
    pub fn update_profile(&self, user_id: &str, f: impl FnOnce(&mut UserProfile)) -> Result<()> {
        self.load_profile(user_id);
        self.engine.update_profile(user_id, f)?;
        if let Some(profile) = self.engine.profile(user_id) {
            self.refresh_cached_profile(&profile);
        }
        Ok(())
    }

    fn refresh_cached_profile(&self, profile: &UserProfile) {
        self.cache.cache_user_profile(&profile.id, profile);
        self.cache
            .cache_reading_history(&profile.id, &profile.reading_history);
    }

    /// The engine's profile, or the cached copy (which is then restored
    /// into the engine).
    pub fn load_profile(&self, user_id: &str) -> Option<UserProfile> {
        if let Some(profile) = self.engine.profile(user_id) {
            return Some(profile);
        }
        let cached: UserProfile = self.cache.cached_user_profile(user_id)?;
        if cached.id != user_id || cached.validate().is_err() {
            debug!("Ignoring unusable cached profile for {}", user_id);
            return None;
        }
        self.engine.upsert_profile(cached.clone()).ok()?;
        debug!("Restored profile {} from cache", user_id);
        Some(cached)
    }

    /// Reading history, from cache when fresh.
    ///
    /// The cached copy is refreshed by `save_profile` and `update_profile`.
    /// Edits made directly through `engine()` are not seen until it expires.
    pub fn reading_history(&self, user_id: &str) -> Vec<ReadingEntry> {
        if let Some(history) = self.cache.cached_reading_history(user_id) {
            return history;
        }
        match self.load_profile(user_id) {
            Some(profile) => {
                self.cache
                    .cache_reading_history(user_id, &profile.reading_history);
                profile.reading_history
            }
            None => Vec::new(),
        }
    }

    pub fn recommendations(&self, user_id: &str, limit: usize) -> Vec<RecommendationScore> {
        let profile = self.load_profile(user_id);
        self.engine.recommend(profile.as_ref(), limit)
    }

    pub fn exchange_matches(
        &self,
        user_id: &str,
        held_manga_id: &str,
        limit: usize,
    ) -> Vec<ExchangeMatch> {
        self.load_profile(user_id);
        self.engine
            .find_exchange_matches(user_id, held_manga_id, limit)
    }
}
