//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Default TTL for cache entries: 5 minutes.
pub const DEFAULT_TTL_MS: i64 = 300_000;
/// Default bound on the number of cache entries.
pub const DEFAULT_MAX_ENTRIES: usize = 50;
/// Reserved prefix for every key the cache writes.
pub const DEFAULT_KEY_PREFIX: &str = "@mangaswap_cache:";

/// Paths to all MangaSwap data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Key-value storage directory (`data/storage/`).
    pub storage: PathBuf,
    /// Catalog reference data (`data/catalog.json`).
    pub catalog_file: PathBuf,
    /// Service configuration (`data/config.json`).
    pub config_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            storage: root.join("storage"),
            catalog_file: root.join("catalog.json"),
            config_file: root.join("config.json"),
            root,
        };
        std::fs::create_dir_all(&paths.storage)?;
        Ok(paths)
    }
}

/// Cache manager settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Maximum number of namespaced entries kept after a sweep.
    pub max_entries: usize,
    /// TTL applied when `set` is called without one.
    pub default_ttl_ms: i64,
    /// Prefix separating cache keys from other users of the store.
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            default_ttl_ms: DEFAULT_TTL_MS,
            key_prefix: DEFAULT_KEY_PREFIX.into(),
        }
    }
}

const SLOT_EPSILON: f64 = 1e-9;

/// Share of the requested limit each recommendation category may fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CategoryBudgets {
    pub genre_match: f64,
    pub collaborative: f64,
    pub author_match: f64,
    pub similar: f64,
    pub trending: f64,
}

impl Default for CategoryBudgets {
    fn default() -> Self {
        Self {
            genre_match: 0.30,
            collaborative: 0.25,
            author_match: 0.20,
            similar: 0.15,
            trending: 0.10,
        }
    }
}

impl CategoryBudgets {
    /// Number of slots a category with `share` gets out of `limit`.
    pub fn slots(share: f64, limit: usize) -> usize {
        if limit == 0 || share <= 0.0 {
            return 0;
        }
        // 0.1 * 30 is 3.0000000000000004 in f64.
        ((limit as f64) * share - SLOT_EPSILON).ceil() as usize
    }
}

/// Recommendation scorer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecommendConfig {
    pub budgets: CategoryBudgets,
    /// Minimum user-user similarity for collaborative signals.
    pub similarity_threshold: f64,
    /// History rating (0-10) at which an item counts as liked.
    pub liked_rating: f64,
    /// Exchange matches scoring below this are discarded.
    pub exchange_threshold: f64,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            budgets: CategoryBudgets::default(),
            similarity_threshold: 0.1,
            liked_rating: 4.0,
            exchange_threshold: 0.3,
        }
    }
}

/// Top-level MangaSwap configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub cache: CacheConfig,
    pub recommend: RecommendConfig,
}

impl AppConfig {
    /// Load config from file, falling back to defaults when the file is
    /// missing. A file that exists but does not parse is an error.
    pub fn load(config_path: &Path) -> Result<Self> {
        let raw = match std::fs::read_to_string(config_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "No config at {}, using defaults",
                    config_path.display()
                );
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: AppConfig = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", config_path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to disk.
    pub fn save(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, json)?;
        info!("Saved config to {}", config_path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache.max_entries == 0 {
            return Err(Error::Config("cache.maxEntries must be at least 1".into()));
        }
        if self.cache.default_ttl_ms <= 0 {
            return Err(Error::Config("cache.defaultTtlMs must be positive".into()));
        }
        if self.cache.key_prefix.is_empty() {
            warn!("Empty cache key prefix: clear() will remove every key in the store");
        }
        Ok(())
    }
}
