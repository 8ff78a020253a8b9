//! Shared paths and JSON settings files for LexChat applications
//!
//! Settings live in the config directory (~/.config/lexchat/), chat history
//! in the data directory (~/.local/share/lexchat/ on Linux).
//!
//! Call [`init`] at application startup to bootstrap the config directory.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "lexchat";

/// Create the config directory if needed and return it.
pub fn init() -> Result<PathBuf> {
    let dir = config_dir().context("Could not determine config directory")?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
    Ok(dir)
}

pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_DIR))
}

pub fn data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join(APP_DIR))
}

/// Path of a file inside the config directory
pub fn config_path(filename: &str) -> Option<PathBuf> {
    config_dir().map(|p| p.join(filename))
}

/// Load a JSON file from the config directory.
///
/// Returns `Ok(None)` when the file does not exist; a file that exists but
/// does not parse is an error.
pub fn load_json<T: DeserializeOwned>(filename: &str) -> Result<Option<T>> {
    let path = config_path(filename).context("Could not determine config directory")?;
    if !path.exists() {
        return Ok(None);
    }
    load_json_file(&path).map(Some)
}

pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Save `value` to a JSON file in the config directory, returning its path
pub fn save_json<T: Serialize>(filename: &str, value: &T) -> Result<PathBuf> {
    let path = init()?.join(filename);
    save_json_file(&path, value)?;
    Ok(path)
}

/// Write pretty-printed JSON through a temp file, so readers never see half a file
pub fn save_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, content)
        .with_context(|| format!("Failed to write {}", temp_path.display()))?;
    std::fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
