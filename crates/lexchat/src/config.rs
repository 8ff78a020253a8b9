//! Client settings
//!
//! Settings are resolved in order of priority:
//! 1. Environment variables (`LEXCHAT_API_URL`, `LEXCHAT_TIMEOUT_SECS`,
//!    `LEXCHAT_AUTO_SPEAK`, `LEXCHAT_STORAGE`, `LEXCHAT_DATA_DIR`)
//! 2. JSON file (~/.config/lexchat/settings.json)
//! 3. Built-in defaults

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::storage::{FileStore, InMemoryStore, KeyValueStore, SqliteStore};

/// Settings filename in the LexChat config directory
const SETTINGS_FILE: &str = "settings.json";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Which persistent store holds chat history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON document, `storage.json`
    #[default]
    File,
    /// SQLite database, `lexchat.db`
    Sqlite,
    /// Nothing survives the process
    Memory,
}

impl StorageBackend {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" | "json" => Ok(Self::File),
            "sqlite" | "db" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => bail!("Unknown storage backend '{}' (expected file, sqlite or memory)", other),
        }
    }

    /// Open the store inside `dir`
    pub fn open(self, dir: &Path) -> Result<Arc<dyn KeyValueStore>> {
        let store: Arc<dyn KeyValueStore> = match self {
            Self::File => Arc::new(FileStore::new(dir.join("storage.json"))?),
            Self::Sqlite => {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
                Arc::new(SqliteStore::new(dir.join("lexchat.db"))?)
            }
            Self::Memory => Arc::new(InMemoryStore::new()),
        };
        Ok(store)
    }
}

/// Settings for talking to the service and keeping history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Read answers aloud after they arrive
    pub auto_speak: bool,
    pub storage: StorageBackend,
    /// Overrides the platform data directory
    pub data_dir: Option<PathBuf>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            auto_speak: true,
            storage: StorageBackend::default(),
            data_dir: None,
        }
    }
}

impl ClientSettings {
    /// Load settings from the config file (if any) and apply environment overrides
    pub fn load() -> Result<Self> {
        let settings: Self = config::load_json(SETTINGS_FILE)?.unwrap_or_default();
        settings.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Write these settings to the config directory; returns the file written
    pub fn save(&self) -> Result<PathBuf> {
        config::save_json(SETTINGS_FILE, self)
    }

    /// Load settings from a specific JSON file, without environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        config::load_json_file(path)
    }

    /// Apply overrides looked up by variable name
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = lookup("LEXCHAT_API_URL").filter(|v| !v.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(secs) = lookup("LEXCHAT_TIMEOUT_SECS") {
            self.timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("LEXCHAT_TIMEOUT_SECS is not a number: {}", secs))?;
        }
        if let Some(flag) = lookup("LEXCHAT_AUTO_SPEAK") {
            self.auto_speak = parse_bool(&flag)
                .with_context(|| format!("LEXCHAT_AUTO_SPEAK is not a boolean: {}", flag))?;
        }
        if let Some(kind) = lookup("LEXCHAT_STORAGE") {
            self.storage = StorageBackend::parse(&kind)?;
        }
        if let Some(dir) = lookup("LEXCHAT_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        Ok(self)
    }

    /// Get the default settings file path (~/.config/lexchat/settings.json)
    pub fn default_settings_path() -> Option<PathBuf> {
        config::config_path(SETTINGS_FILE)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Directory holding chat history
    pub fn resolved_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => config::data_dir().context("Could not determine data directory"),
        }
    }

    /// Open the configured persistent store
    pub fn open_store(&self) -> Result<Arc<dyn KeyValueStore>> {
        let dir = match self.storage {
            // Never touches the disk
            StorageBackend::Memory => PathBuf::new(),
            _ => self.resolved_data_dir()?,
        };
        self.storage.open(&dir)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = ClientSettings::default();
        assert_eq!(settings.base_url, "http://localhost:8000");
        assert_eq!(settings.timeout(), Duration::from_secs(120));
        assert!(settings.auto_speak);
        assert_eq!(settings.storage, StorageBackend::File);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"base_url": "http://legal.internal:9000", "storage": "sqlite"}"#).unwrap();

        let settings = ClientSettings::from_file(&path).unwrap();
        assert_eq!(settings.base_url, "http://legal.internal:9000");
        assert_eq!(settings.storage, StorageBackend::Sqlite);
        assert_eq!(settings.timeout_secs, 120);
        assert!(settings.auto_speak);
    }

    #[test]
    fn test_environment_overrides() {
        let settings = ClientSettings::default()
            .apply_overrides(env(&[
                ("LEXCHAT_API_URL", " http://10.0.0.2:8000 "),
                ("LEXCHAT_TIMEOUT_SECS", "30"),
                ("LEXCHAT_AUTO_SPEAK", "off"),
                ("LEXCHAT_STORAGE", "SQLite"),
                ("LEXCHAT_DATA_DIR", "/tmp/lexchat-data"),
            ]))
            .unwrap();

        assert_eq!(settings.base_url, "http://10.0.0.2:8000");
        assert_eq!(settings.timeout_secs, 30);
        assert!(!settings.auto_speak);
        assert_eq!(settings.storage, StorageBackend::Sqlite);
        assert_eq!(settings.resolved_data_dir().unwrap(), PathBuf::from("/tmp/lexchat-data"));
    }

    #[test]
    fn test_invalid_overrides_are_errors() {
        assert!(ClientSettings::default()
            .apply_overrides(env(&[("LEXCHAT_TIMEOUT_SECS", "soon")]))
            .is_err());
        assert!(ClientSettings::default()
            .apply_overrides(env(&[("LEXCHAT_AUTO_SPEAK", "maybe")]))
            .is_err());
        assert!(ClientSettings::default()
            .apply_overrides(env(&[("LEXCHAT_STORAGE", "cloud")]))
            .is_err());
    }

    #[test]
    fn test_open_store_in_data_dir() {
        let dir = TempDir::new().unwrap();
        for (kind, file) in [(StorageBackend::File, "storage.json"), (StorageBackend::Sqlite, "lexchat.db")] {
            let settings = ClientSettings {
                storage: kind,
                data_dir: Some(dir.path().to_path_buf()),
                ..ClientSettings::default()
            };
            let store = settings.open_store().unwrap();
            store.set("theme", "dark").unwrap();
            assert!(dir.path().join(file).exists(), "{} missing", file);
        }
    }
}
