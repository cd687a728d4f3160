//! Key-value persistence and the saved-records list.
//!
//! The saved list lives under a single fixed key. Updates are
//! read-modify-write without locking, so concurrent writers race and the
//! last write wins.

use std::collections::HashMap;
use std::fmt::Debug;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::models::Record;

/// Key the saved list is stored under
pub const STORAGE_KEY: &str = "psisearch_saved_v1";

/// Errors from the persistence layer
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Minimal string key-value store
pub trait KeyValueStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write through a temp file in the same directory, then rename
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.flush()?;
        tmp.persist(self.path_for(key)).map_err(|e| e.error)?;
        Ok(())
    }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Records the user chose to keep. Each item is a snapshot taken at save
/// time and is not refreshed by later searches.
#[derive(Debug, Clone)]
pub struct SavedList {
    store: Arc<dyn KeyValueStore>,
}

impl SavedList {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Saved list backed by a fresh [`MemoryStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Current items. Missing or unreadable content yields an empty list.
    pub fn load(&self) -> Vec<Record> {
        self.read().unwrap_or_else(|e| {
            tracing::warn!("Failed to read saved list: {}", e);
            Vec::new()
        })
    }

    /// Current items for a read-modify-write. Corrupt content counts as
    /// empty, but a failed read is returned so nothing gets overwritten.
    fn read(&self) -> Result<Vec<Record>, StoreError> {
        let Some(raw) = self.store.get(STORAGE_KEY)? else {
            return Ok(Vec::new());
        };

        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("Saved list is corrupt, starting empty: {}", e);
            Vec::new()
        }))
    }

    /// Replace the stored items
    pub fn save(&self, items: &[Record]) -> Result<(), StoreError> {
        let json = serde_json::to_string(items)?;
        self.store.set(STORAGE_KEY, &json)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.load().iter().any(|r| r.id == id)
    }

    pub fn get(&self, id: &str) -> Option<Record> {
        self.load().into_iter().find(|r| r.id == id)
    }

    /// Add a snapshot if absent, remove by id if present.
    /// Returns whether the record is saved afterwards.
    pub fn toggle(&self, record: &Record) -> Result<bool, StoreError> {
        let mut items = self.read()?;
        let before = items.len();
        items.retain(|r| r.id != record.id);

        let saved = items.len() == before;
        if saved {
            items.push(record.clone());
        }
        self.save(&items)?;
        tracing::debug!(id = %record.id, saved, "Toggled saved record");
        Ok(saved)
    }

    /// Remove by id; returns whether anything was removed
    pub fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let mut items = self.read()?;
        let before = items.len();
        items.retain(|r| r.id != id);
        if items.len() == before {
            return Ok(false);
        }
        self.save(&items)?;
        Ok(true)
    }
}
