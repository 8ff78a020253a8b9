//! Single-file JSON storage
//!
//! Every key lives in one JSON object on disk, the same shape browser local
//! storage would have:
//! ```text
//! {
//!   "activeChatId": "6f1c...",
//!   "chats": "[{\"id\":\"6f1c...\",...}]"
//! }
//! ```

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use fs2::FileExt;
use log::warn;

use super::{Entries, KeyValueStore};

type Document = BTreeMap<String, String>;

/// File-backed implementation of KeyValueStore
///
/// Writes go to a temp file which is then renamed over the document, so a
/// crash never leaves a half-written file behind. Mutations hold an
/// exclusive lock on a sibling `.lock` file, so two processes sharing the
/// same document cannot lose each other's updates.
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
    guard: Mutex<()>,
}

impl FileStore {
    /// Open (or lazily create) the store at the given path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create storage directory: {}", parent.display()))?;
        }

        let mut lock_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        lock_name.push(".lock");
        let lock_path = path.with_file_name(lock_name);

        Ok(Self {
            path,
            lock_path,
            guard: Mutex::new(()),
        })
    }

    /// Path of the backing document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole document; a missing file is an empty document.
    ///
    /// Returns `None` when the file exists but does not parse. Reads never
    /// move it; only [`Self::mutate`], under the lock file, does.
    fn read(&self) -> Result<Option<Document>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Some(Document::new())),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read storage file: {}", self.path.display()));
            }
        };
        if content.trim().is_empty() {
            return Ok(Some(Document::new()));
        }

        match serde_json::from_str(&content) {
            Ok(doc) => Ok(Some(doc)),
            Err(e) => {
                warn!("Storage file {} is corrupt: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    /// Read for plain lookups; a corrupt document reads as empty
    fn read_lenient(&self) -> Result<Document> {
        let _guard = self.guard.lock().map_err(|_| anyhow!("File store lock poisoned"))?;
        Ok(self.read()?.unwrap_or_default())
    }

    /// Move a corrupt document to `<name>.corrupt`. Caller holds the lock file.
    fn quarantine(&self) -> Result<()> {
        let backup = self.path.with_extension("corrupt");
        warn!("Moving corrupt storage file {} to {}", self.path.display(), backup.display());
        fs::rename(&self.path, &backup)
            .with_context(|| format!("Failed to move corrupt file to {}", backup.display()))
    }

    fn save(&self, doc: &Document) -> Result<()> {
        let content = serde_json::to_string_pretty(doc)?;

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write storage file: {}", temp_path.display()))?;
        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to replace storage file: {}", self.path.display()))?;
        Ok(())
    }

    fn lock_file(&self) -> Result<File> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .with_context(|| format!("Failed to open lock file: {}", self.lock_path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("Failed to lock {}", self.lock_path.display()))?;
        Ok(file)
    }

    /// Run a mutation against the document under both locks.
    ///
    /// The document is only rewritten when `mutate` reports a change.
    fn mutate<R>(&self, mutate: impl FnOnce(&mut Document) -> Result<(R, bool)>) -> Result<R> {
        let _guard = self.guard.lock().map_err(|_| anyhow!("File store lock poisoned"))?;
        // Released when dropped
        let _lock = self.lock_file()?;

        let mut doc = match self.read()? {
            Some(doc) => doc,
            None => {
                self.quarantine()?;
                Document::new()
            }
        };
        let (result, changed) = mutate(&mut doc)?;
        if changed {
            self.save(&doc)?;
        }
        Ok(result)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_lenient()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.mutate(|doc| {
            let previous = doc.insert(key.to_string(), value.to_string());
            Ok(((), previous.as_deref() != Some(value)))
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.mutate(|doc| {
            let removed = doc.remove(key).is_some();
            Ok(((), removed))
        })
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.read_lenient()?.into_keys().collect())
    }

    fn clear(&self) -> Result<()> {
        self.mutate(|doc| {
            let had_data = !doc.is_empty();
            doc.clear();
            Ok(((), had_data))
        })
    }

    fn update(&self, keys: &[&str], apply: &mut dyn FnMut(&mut Entries) -> Result<()>) -> Result<()> {
        self.mutate(|doc| {
            let mut entries: Entries = keys
                .iter()
                .map(|k| (k.to_string(), doc.get(*k).cloned()))
                .collect();
            apply(&mut entries)?;

            let mut changed = false;
            for (key, value) in entries {
                if doc.get(&key) == value.as_ref() {
                    continue;
                }
                changed = true;
                match value {
                    Some(v) => {
                        doc.insert(key, v);
                    }
                    None => {
                        doc.remove(&key);
                    }
                }
            }
            Ok(((), changed))
        })
    }
}
