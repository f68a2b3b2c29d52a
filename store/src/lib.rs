#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Persisted key-value substrates for Last Stand.
//!
//! Both stores implement [`KeyValueStore`]: [`MemoryStore`] keeps values for
//! the lifetime of the process and is what tests and headless simulations
//! use, while [`FileStore`] mirrors the same map into a JSON document on disk
//! every time [`KeyValueStore::save`] is called.

use std::{
    collections::BTreeMap,
    convert::Infallible,
    fs, io,
    path::{Path, PathBuf},
};

use last_stand_core::KeyValueStore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Single typed value held by a store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StoredValue {
    /// Integer cell.
    Int(i32),
    /// Floating point cell.
    Float(f32),
    /// Text cell.
    String(String),
}

/// Errors reported while loading or saving a [`FileStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("failed to access store file '{path}': {source}")]
    Io {
        /// Location of the backing file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The backing file exists but does not contain a valid document.
    #[error("store file '{path}' is corrupt: {source}")]
    Corrupt {
        /// Location of the backing file.
        path: PathBuf,
        /// Underlying decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// The in-memory map could not be encoded.
    #[error("failed to encode store contents: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Volatile store backed by an ordered map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryStore {
    values: BTreeMap<String, StoredValue>,
    saves: usize,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Reports whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of times [`KeyValueStore::save`] was invoked.
    #[must_use]
    pub const fn save_count(&self) -> usize {
        self.saves
    }

    /// Iterator over the stored keys in lexicographic order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    type Error = Infallible;

    fn get_int(&self, key: &str) -> Option<i32> {
        read_int(&self.values, key)
    }

    fn set_int(&mut self, key: &str, value: i32) {
        let _ = self.values.insert(key.to_owned(), StoredValue::Int(value));
    }

    fn get_float(&self, key: &str) -> Option<f32> {
        read_float(&self.values, key)
    }

    fn set_float(&mut self, key: &str, value: f32) {
        let _ = self.values.insert(key.to_owned(), StoredValue::Float(value));
    }

    fn get_string(&self, key: &str) -> Option<String> {
        read_string(&self.values, key)
    }

    fn set_string(&mut self, key: &str, value: &str) {
        let _ = self
            .values
            .insert(key.to_owned(), StoredValue::String(value.to_owned()));
    }

    fn delete_key(&mut self, key: &str) {
        let _ = self.values.remove(key);
    }

    fn has_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn save(&mut self) -> Result<(), Self::Error> {
        self.saves = self.saves.saturating_add(1);
        Ok(())
    }
}

/// Store that persists its map as a JSON document.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, StoredValue>,
    dirty: bool,
}

impl FileStore {
    /// Opens the store located at `path`. A missing file yields an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(error) if error.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        debug!(path = %path.display(), keys = values.len(), "store_opened");
        Ok(Self {
            path,
            values,
            dirty: false,
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reports whether writes are pending since the last save.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn insert(&mut self, key: &str, value: StoredValue) {
        let _ = self.values.insert(key.to_owned(), value);
        self.dirty = true;
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl KeyValueStore for FileStore {
    type Error = StoreError;

    fn get_int(&self, key: &str) -> Option<i32> {
        read_int(&self.values, key)
    }

    fn set_int(&mut self, key: &str, value: i32) {
        self.insert(key, StoredValue::Int(value));
    }

    fn get_float(&self, key: &str) -> Option<f32> {
        read_float(&self.values, key)
    }

    fn set_float(&mut self, key: &str, value: f32) {
        self.insert(key, StoredValue::Float(value));
    }

    fn get_string(&self, key: &str) -> Option<String> {
        read_string(&self.values, key)
    }

    fn set_string(&mut self, key: &str, value: &str) {
        self.insert(key, StoredValue::String(value.to_owned()));
    }

    fn delete_key(&mut self, key: &str) {
        if self.values.remove(key).is_some() {
            self.dirty = true;
        }
    }

    fn has_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn save(&mut self) -> Result<(), Self::Error> {
        let encoded = serde_json::to_vec_pretty(&self.values).map_err(StoreError::Encode)?;

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }

        // Rename over the old file so a crash never leaves a half-written document.
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, encoded).map_err(|source| self.io_error(source))?;
        fs::rename(&staging, &self.path).map_err(|source| self.io_error(source))?;

        self.dirty = false;
        debug!(path = %self.path.display(), keys = self.values.len(), "store_saved");
        Ok(())
    }
}

fn read_int(values: &BTreeMap<String, StoredValue>, key: &str) -> Option<i32> {
    match values.get(key) {
        Some(StoredValue::Int(value)) => Some(*value),
        _ => None,
    }
}

fn read_float(values: &BTreeMap<String, StoredValue>, key: &str) -> Option<f32> {
    match values.get(key) {
        Some(StoredValue::Float(value)) => Some(*value),
        _ => None,
    }
}

fn read_string(values: &BTreeMap<String, StoredValue>, key: &str) -> Option<String> {
    match values.get(key) {
        Some(StoredValue::String(value)) => Some(value.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static SCRATCH_COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn scratch_path(name: &str) -> PathBuf {
        let index = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir()
            .join(format!("last-stand-store-{}-{index}", std::process::id()))
            .join(name)
    }

    #[test]
    fn typed_reads_ignore_mismatched_cells() {
        let mut store = MemoryStore::new();
        store.set_int("count", 3);
        store.set_float("time", 1.5);
        store.set_string("stamp", "now");

        assert_eq!(store.get_int("count"), Some(3));
        assert_eq!(store.get_float("count"), None);
        assert_eq!(store.get_string("time"), None);
        assert_eq!(store.get_float("time"), Some(1.5));
        assert_eq!(store.get_string("stamp").as_deref(), Some("now"));
        assert_eq!(store.get_int("missing"), None);
    }

    #[test]
    fn delete_removes_any_type() {
        let mut store = MemoryStore::new();
        store.set_string("key", "value");
        assert!(store.has_key("key"));

        store.delete_key("key");
        store.delete_key("never-written");

        assert!(!store.has_key("key"));
        assert!(store.is_empty());
    }

    #[test]
    fn file_store_survives_reopen() {
        let path = scratch_path("prefs.json");
        let mut store = FileStore::open(&path).expect("open missing file");
        assert!(!store.has_key("CurrentLevel"));

        store.set_int("CurrentLevel", 2);
        store.set_float("GameRecord_1_TimeTaken", 42.5);
        assert!(store.is_dirty());
        store.save().expect("save");
        assert!(!store.is_dirty());

        let reopened = FileStore::open(&path).expect("reopen");
        assert_eq!(reopened.get_int("CurrentLevel"), Some(2));
        assert_eq!(reopened.get_float("GameRecord_1_TimeTaken"), Some(42.5));
    }

    #[test]
    fn unsaved_writes_are_not_durable() {
        let path = scratch_path("prefs.json");
        let mut store = FileStore::open(&path).expect("open");
        store.set_int("CurrentLevel", 3);
        drop(store);

        let reopened = FileStore::open(&path).expect("reopen");
        assert_eq!(reopened.get_int("CurrentLevel"), None);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let path = scratch_path("corrupt.json");
        fs::create_dir_all(path.parent().expect("parent")).expect("create dir");
        fs::write(&path, b"{ not json").expect("write corrupt file");

        let error = FileStore::open(&path).expect_err("corrupt file must fail");
        assert!(matches!(error, StoreError::Corrupt { .. }), "{error:?}");
    }
}
