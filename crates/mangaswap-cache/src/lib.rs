//! MangaSwap Cache: namespaced TTL cache over persistent key-value storage.
//!
//! Reads never fail: storage errors and corrupt payloads are logged and
//! reported as misses. Writes sweep expired entries and evict the oldest
//! ones past the capacity bound (default 50).

pub mod manager;
pub mod types;
pub mod wrappers;

pub use manager::CacheManager;
pub use types::*;
pub use wrappers::search_key;
