//! Durable string key-value storage
//!
//! The settings and shuffle-order stores persist through this trait. The
//! browser build backs it with `localStorage`; the CLI uses [`FileStore`].
use crate::error::StorageError;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::io::ErrorKind;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Key holding the serialized settings record
pub const SETTINGS_KEY: &str = "vdd_settings";
/// Key holding the serialized shuffle order
pub const ORDER_KEY: &str = "vdd_order";
/// Key holding the shuffle cursor as a decimal string
pub const ORDER_INDEX_KEY: &str = "vdd_order_index";

/// Synchronous string-to-string storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// In-memory store
///
/// Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    // Each write is a single map call, so a poisoned map is still whole
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, String>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, String>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.write().remove(key);
        Ok(())
    }
}

/// Store persisted as a single JSON object on disk
///
/// Every write rewrites the whole file. A missing file reads as an empty
/// store. An unreadable or malformed file reads as empty too, but writes to
/// it fail rather than replace its contents.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        FileStore { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.read_all() {
            Ok(mut entries) => entries.remove(key),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "state file is unreadable, treating it as empty"
                );
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k"), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k"), Some("v".to_string()));
        store.remove("k").unwrap();
        assert!(!store.contains("k"));
    }

    #[test]
    fn test_memory_store_clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.set(SETTINGS_KEY, "{}").unwrap();
        assert_eq!(other.get(SETTINGS_KEY), Some("{}".to_string()));
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = FileStore::new(path.clone());
        store.set(ORDER_INDEX_KEY, "3").unwrap();
        store.set(ORDER_KEY, "[\"A\"]").unwrap();

        let reopened = FileStore::new(path);
        assert_eq!(reopened.get(ORDER_INDEX_KEY), Some("3".to_string()));
        reopened.remove(ORDER_INDEX_KEY).unwrap();
        assert_eq!(store.get(ORDER_INDEX_KEY), None);
        assert_eq!(store.get(ORDER_KEY), Some("[\"A\"]".to_string()));
    }

    #[test]
    fn test_memory_store_survives_poisoned_lock() {
        let store = MemoryStore::new();
        store.set(SETTINGS_KEY, "{}").unwrap();
        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.entries.write().unwrap();
            panic!("panicked while holding the lock");
        })
        .join();
        assert!(store.entries.is_poisoned());

        store.set(ORDER_KEY, "[]").unwrap();
        assert_eq!(store.get(ORDER_KEY), Some("[]".to_string()));
        assert_eq!(store.get(SETTINGS_KEY), Some("{}".to_string()));
        store.remove(SETTINGS_KEY).unwrap();
        assert!(!store.contains(SETTINGS_KEY));
    }

    #[test]
    fn test_file_store_keeps_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let hand_edited = "{\"vdd_settings\": \"{}\", \"vdd_order\": [}";
        std::fs::write(&path, hand_edited).unwrap();

        let store = FileStore::new(path.clone());
        assert_eq!(store.get(SETTINGS_KEY), None);
        assert!(matches!(
            store.set(SETTINGS_KEY, "x"),
            Err(StorageError::Serialize(_))
        ));
        assert!(store.remove(ORDER_KEY).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), hand_edited);
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent.json"));
        assert_eq!(store.get(SETTINGS_KEY), None);
        store.remove(SETTINGS_KEY).unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_unreadable_path_fails_writes() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be read as a file
        let store = FileStore::new(dir.path().to_path_buf());
        assert_eq!(store.get(SETTINGS_KEY), None);
        assert!(matches!(
            store.set(SETTINGS_KEY, "x"),
            Err(StorageError::Io(_))
        ));
    }
}
