//! Durable per-origin key/value storage.
//!
//! Holds the few values that outlive a session: the secondary-display
//! preference and the monitor's last active tower. `FileStore` persists a
//! flat TOML table with atomic writes (write to `.tmp`, then rename);
//! `MemoryStore` is a cloneable in-process store whose clones share state,
//! which is what two windows of the same origin observe.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use cellmap_common::StoreError;
use tracing::{debug, warn};

use crate::paths::data_dir;

/// Key of the "open auxiliary windows on a secondary display" preference.
pub const PREFER_SECONDARY_KEY: &str = "preferSecondaryDisplay";

/// Key of the tower the monitor window last monitored.
pub const ACTIVE_TOWER_KEY: &str = "activeTower";

/// String key/value storage shared by every window of one origin.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Read a boolean value; anything other than `true`/`false` reads as absent.
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        self.set(key, if value { "true" } else { "false" })
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| StoreError::Write("memory store lock poisoned".into()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

/// Key/value store persisted as a flat TOML table.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`.
    ///
    /// A missing file is an empty store. A file that cannot be parsed is
    /// logged and treated as empty; it is overwritten on the next `set`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), "unreadable store, starting empty: {e}");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(StoreError::Read(format!(
                    "failed to read {}: {e}",
                    path.display()
                )))
            }
        };

        debug!(path = %path.display(), entries = values.len(), "store opened");
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Open the store at the platform default location
    /// (`<data_dir>/cellmap/storage.toml`).
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(default_store_path()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let content = toml::to_string(values)
            .map_err(|e| StoreError::Write(format!("failed to serialize store: {e}")))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Write(format!(
                    "failed to create store directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let tmp_path = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp_path, &content).map_err(|e| {
            StoreError::Write(format!("failed to write {}: {e}", tmp_path.display()))
        })?;

        if let Err(e) = std::fs::rename(&tmp_path, &self.path) {
            warn!("atomic rename failed ({e}), falling back to direct write");
            std::fs::write(&self.path, &content).map_err(|e2| {
                StoreError::Write(format!("failed to write {}: {e2}", self.path.display()))
            })?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| StoreError::Write("file store lock poisoned".into()))?;
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)?;
        debug!(key, path = %self.path.display(), "store value saved");
        Ok(())
    }
}

/// Platform default store path.
pub fn default_store_path() -> Result<PathBuf, StoreError> {
    data_dir()
        .map(|dir| dir.join("storage.toml"))
        .map_err(|e| StoreError::Location(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_store_clones_share_values() {
        let a = MemoryStore::new();
        let b = a.clone();
        a.set("k", "v").unwrap();
        assert_eq!(b.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn get_bool_parses_only_booleans() {
        let store = MemoryStore::new();
        assert_eq!(store.get_bool(PREFER_SECONDARY_KEY), None);

        store.set_bool(PREFER_SECONDARY_KEY, true).unwrap();
        assert_eq!(store.get_bool(PREFER_SECONDARY_KEY), Some(true));

        store.set(PREFER_SECONDARY_KEY, "yes").unwrap();
        assert_eq!(store.get_bool(PREFER_SECONDARY_KEY), None);
    }

    #[test]
    fn file_store_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("storage.toml")).unwrap();
        assert_eq!(store.get(ACTIVE_TOWER_KEY), None);
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("storage.toml");

        let store = FileStore::open(&path).unwrap();
        store.set_bool(PREFER_SECONDARY_KEY, true).unwrap();
        store.set(ACTIVE_TOWER_KEY, "NL-0042").unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("toml.tmp").exists());

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get_bool(PREFER_SECONDARY_KEY), Some(true));
        assert_eq!(reopened.get(ACTIVE_TOWER_KEY).as_deref(), Some("NL-0042"));
    }

    #[test]
    fn file_store_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.toml");
        std::fs::write(&path, "[[[ not toml").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get(PREFER_SECONDARY_KEY), None);

        store.set_bool(PREFER_SECONDARY_KEY, false).unwrap();
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get_bool(PREFER_SECONDARY_KEY), Some(false));
    }

    #[test]
    fn default_store_path_is_in_data_dir() {
        let path = default_store_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "storage.toml");
        assert!(path.parent().unwrap().ends_with("cellmap"));
    }
}
