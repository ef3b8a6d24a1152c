//! Storage boundary used by the cache.

use mangaswap_core::Result;

/// A persistent string key-value store.
///
/// Any local key-value backend satisfies this; the cache layers its
/// namespacing, expiry and eviction on top.
pub trait KeyValueStorage: Send + Sync {
    /// Read a value. `Ok(None)` when the key is absent.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a key. Deleting an absent key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Every key currently stored, in no particular order.
    fn get_all_keys(&self) -> Result<Vec<String>>;

    /// Delete several keys.
    fn multi_remove(&self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.remove_item(key)?;
        }
        Ok(())
    }
}
