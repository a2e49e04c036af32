//! Best-effort key-value persistence
//!
//! Progress and settings are stored as JSON values under string keys. The
//! absence of a key is normal (first run); read and write failures are
//! reported to the caller, which logs them and carries on.
//!
//! Backends:
//! - `MemoryStore`: in-process map (tests, headless runs)
//! - `FileStore`: one JSON document on disk (native)
//! - `LocalStore`: browser LocalStorage (wasm32)

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StorageError;

/// A JSON key-value store.
pub trait KeyValueStore: Debug {
    /// Read the value stored under `key`, `Ok(None)` when it was never written.
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: Value) -> Result<(), StorageError>;
}

/// Load a typed value, treating missing, unreadable or malformed data as absent.
pub fn load_or_none<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    match store.get(key) {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("Ignoring malformed value for {}: {}", key, e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            log::warn!("Failed to load {}: {}", key, e);
            None
        }
    }
}

/// Save a typed value, logging (never propagating) failures.
pub fn save_best_effort<T: Serialize>(store: &mut dyn KeyValueStore, key: &str, value: &T) {
    let result = serde_json::to_value(value)
        .map_err(StorageError::from)
        .and_then(|v| store.set(key, v));
    if let Err(e) = result {
        log::warn!("Failed to save {}: {}", key, e);
    }
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw access for inspection
    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// A store kept as a single JSON object on disk.
///
/// The whole document is rewritten on every `set`; the game writes a handful
/// of small values, so this stays cheap.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, Value>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`. A missing or corrupt file
    /// starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                log::warn!("Discarding corrupt store {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                log::warn!("Failed to read store {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    fn flush(&self) -> Result<(), StorageError> {
        let text = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }
}

/// Browser LocalStorage (wasm32 only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct LocalStore;

#[cfg(target_arch = "wasm32")]
impl LocalStore {
    fn storage() -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(StorageError::Unavailable)
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let storage = Self::storage()?;
        let raw = storage.get_item(key).map_err(|e| StorageError::Read {
            key: key.to_string(),
            reason: format!("{:?}", e),
        })?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StorageError> {
        let storage = Self::storage()?;
        let json = serde_json::to_string(&value)?;
        storage
            .set_item(key, &json)
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                reason: format!("{:?}", e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A store whose every operation fails
    #[derive(Debug)]
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
            Err(StorageError::Read {
                key: key.to_string(),
                reason: "quota".to_string(),
            })
        }

        fn set(&mut self, _key: &str, _value: Value) -> Result<(), StorageError> {
            Err(StorageError::Unavailable)
        }
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        save_best_effort(&mut store, "gridluck_level", &4u32);
        assert_eq!(load_or_none::<u32>(&store, "gridluck_level"), Some(4));
        assert_eq!(load_or_none::<u32>(&store, "gridluck_missing"), None);
    }

    #[test]
    fn test_malformed_value_is_absent() {
        let mut store = MemoryStore::new();
        store
            .set("gridluck_level", Value::String("not a number".into()))
            .unwrap();
        assert_eq!(load_or_none::<u32>(&store, "gridluck_level"), None);
    }

    #[test]
    fn test_broken_store_degrades() {
        let mut store = BrokenStore;
        save_best_effort(&mut store, "gridluck_level", &2u32);
        assert_eq!(load_or_none::<u32>(&store, "gridluck_level"), None);
    }

    #[test]
    fn test_file_store_persists_across_open() {
        let path = std::env::temp_dir().join(format!(
            "gridluck_store_test_{}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let mut store = FileStore::open(&path);
        save_best_effort(&mut store, "gridluck_totalXP", &150u64);

        let reopened = FileStore::open(&path);
        assert_eq!(load_or_none::<u64>(&reopened, "gridluck_totalXP"), Some(150));

        let _ = std::fs::remove_file(&path);
    }
}
