//! JSON-file key-value store.
//!
//! The whole store is one JSON object mapping keys to values. It is read
//! once on [`FileStore::open`] and written back by [`FileStore::flush`].

use crate::cli::CliError;
use stampwork_core::{KeyValueStore, MemoryStore, StoreError, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File-backed [`KeyValueStore`].
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: MemoryStore,
    dirty: bool,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self, CliError> {
        let entries = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| CliError::io(path, e))?;
            let map: BTreeMap<String, Value> = if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            };
            MemoryStore::from(map)
        } else {
            MemoryStore::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            entries,
            dirty: false,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether unflushed writes exist.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write every entry back to disk if anything changed.
    pub fn flush(&mut self) -> Result<(), CliError> {
        if !self.dirty {
            return Ok(());
        }
        let json = serde_json::to_string_pretty(self.entries.entries())?;
        fs::write(&self.path, json).map_err(|e| CliError::io(&self.path, e))?;
        self.dirty = false;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn save(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.save(key, value)?;
        self.dirty = true;
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.entries.load(key)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.entries.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::open(&dir.path().join("none.json")).expect("open");
        assert_eq!(store.keys(), Ok(Vec::new()));
        assert!(!store.is_dirty());
    }

    #[test]
    fn flush_then_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.json");

        let mut store = FileStore::open(&path).expect("open");
        store.save("post-1", Value::from("hello")).expect("save");
        assert!(store.is_dirty());
        store.flush().expect("flush");
        assert!(!store.is_dirty());

        let reopened = FileStore::open(&path).expect("reopen");
        assert_eq!(reopened.load("post-1"), Ok(Some(Value::from("hello"))));
    }

    #[test]
    fn clean_store_does_not_write() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.json");

        let mut store = FileStore::open(&path).expect("open");
        store.flush().expect("flush");
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_file_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.json");
        fs::write(&path, "not json").expect("write");

        assert!(matches!(FileStore::open(&path), Err(CliError::Json(_))));
    }
}
