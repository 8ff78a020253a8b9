//! Export of the latest assistant answer to a text file

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use std::path::{Path, PathBuf};

use crate::session::ChatSessionStore;

/// Text of the newest assistant message in the active thread
pub fn latest_response_export(session: &ChatSessionStore) -> Option<String> {
    session.latest_assistant_response().map(str::to_string)
}

/// File name used for an export taken at `now`
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("legal-response-{}.txt", now.format("%Y%m%d-%H%M%S"))
}

/// Write the latest answer into `dir`.
///
/// Returns the written path, or `None` if the active thread has no answer yet.
pub fn write_latest_response(
    session: &ChatSessionStore,
    dir: &Path,
    now: DateTime<Utc>,
) -> Result<Option<PathBuf>> {
    let Some(content) = latest_response_export(session) else {
        return Ok(None);
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory: {}", dir.display()))?;
    let path = dir.join(export_file_name(now));
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write export: {}", path.display()))?;

    info!("Exported latest response to {}", path.display());
    Ok(Some(path))
}
