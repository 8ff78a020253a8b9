//! Storage trait definitions

use anyhow::Result;
use std::collections::BTreeMap;

/// Values for a group of keys during an atomic update.
///
/// `None` means the key is absent; setting an entry to `None` removes it.
pub type Entries = BTreeMap<String, Option<String>>;

/// Trait for string-keyed persistent storage
///
/// This trait abstracts over different storage backends (in-memory, a JSON
/// file, SQLite) and mirrors the get/set/remove surface of browser local
/// storage, plus an atomic read-modify-write for multi-key updates.
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under a key
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace the value under a key
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key (no-op if absent)
    fn remove(&self, key: &str) -> Result<()>;

    /// List all keys, sorted
    fn keys(&self) -> Result<Vec<String>>;

    /// Clear all data (for testing)
    fn clear(&self) -> Result<()>;

    /// Atomically read, modify and write back a group of keys.
    ///
    /// `apply` receives the current value of every key in `keys`. All entries
    /// left in the map are written back together once it returns `Ok`; if it
    /// returns an error nothing is written. No other update can interleave
    /// between the read and the write.
    fn update(&self, keys: &[&str], apply: &mut dyn FnMut(&mut Entries) -> Result<()>) -> Result<()>;
}
