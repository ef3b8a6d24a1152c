//! MangaSwap Store: key-value storage boundary with SQLite and in-memory backends.

pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;
pub use traits::KeyValueStorage;
