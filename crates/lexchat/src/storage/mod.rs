//! Persistent key-value storage
//!
//! This module defines the storage abstraction the chat session persists
//! itself through. The trait-based design allows swapping between the
//! in-memory, single-file and SQLite implementations.

mod file;
mod memory;
mod sqlite;
mod traits;

pub use file::FileStore;
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{Entries, KeyValueStore};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Storage keys shared with the browser client's local-storage layout
pub mod keys {
    pub const THEME: &str = "theme";
    pub const CHATS: &str = "chats";
    pub const ACTIVE_CHAT_ID: &str = "activeChatId";
    /// Last `chats` value that could not be decoded, kept before it is overwritten
    pub const CHATS_BACKUP: &str = "chats.corrupt";
}

/// Read a JSON-encoded value stored under `key`
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(raw) => {
            let value = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse stored value for key '{}'", key))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Store `value` JSON-encoded under `key`
pub fn write_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)
        .with_context(|| format!("Failed to serialize value for key '{}'", key))?;
    store.set(key, &raw)
}
