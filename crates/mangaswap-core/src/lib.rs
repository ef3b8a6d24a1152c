//! MangaSwap Core: errors, configuration, clock.

pub mod clock;
pub mod config;
pub mod error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, CacheConfig, CategoryBudgets, DataPaths, RecommendConfig};
pub use error::{Error, Result};
