//! Durable client-side key/value state.
//!
//! The local-storage equivalent for a headless client: a small string-keyed
//! store holding the auth token, the signed-in user, the offline cart, and
//! the applied promo code, so they survive restarts and navigation between
//! cart and checkout.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

/// Well-known storage keys.
pub mod keys {
    /// Key for the bearer token of the signed-in account.
    pub const TOKEN: &str = "token";

    /// Key for the serialized account summary.
    pub const USER: &str = "user";

    /// Key for the serialized offline cart lines.
    pub const CART: &str = "cart";

    /// Key for the applied promo code and its validated percentage.
    pub const PROMO: &str = "promo";
}

/// Errors that can occur reading or writing client-side state.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the state file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The state file or a stored value is not valid JSON.
    #[error("storage parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Durable string-keyed storage.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Shared handle to a storage implementation.
pub type SharedStorage = Arc<dyn Storage>;

// =============================================================================
// MemoryStorage
// =============================================================================

/// In-memory storage. State is lost on drop; intended for tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty in-memory store behind a shared handle.
    #[must_use]
    pub fn shared() -> SharedStorage {
        Arc::new(Self::new())
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        map.remove(key);
        Ok(())
    }
}

// =============================================================================
// FileStorage
// =============================================================================

/// File-backed storage: one JSON object per client, written through on
/// every mutation.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    map: Mutex<HashMap<String, String>>,
}

impl FileStorage {
    /// Open (or create) the state file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing state file cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let map = if path.exists() {
            serde_json::from_str(&fs::read_to_string(&path)?)?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            map: Mutex::new(map),
        })
    }

    /// Open the state file behind a shared handle.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing state file cannot be read or parsed.
    pub fn shared(path: impl Into<PathBuf>) -> Result<SharedStorage, StorageError> {
        Ok(Arc::new(Self::open(path)?))
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, map: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(map)?)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        map.insert(key.to_string(), value.to_string());
        self.persist(&map)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        if map.remove(key).is_some() {
            self.persist(&map)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_state_file() -> PathBuf {
        std::env::temp_dir().join(format!("cartwheel-test-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert!(storage.get(keys::TOKEN).unwrap().is_none());

        storage.set(keys::TOKEN, "abc123").unwrap();
        assert_eq!(storage.get(keys::TOKEN).unwrap().as_deref(), Some("abc123"));

        storage.remove(keys::TOKEN).unwrap();
        assert!(storage.get(keys::TOKEN).unwrap().is_none());
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let path = temp_state_file();

        {
            let storage = FileStorage::open(&path).unwrap();
            storage.set(keys::CART, "[]").unwrap();
            storage.set(keys::PROMO, "{\"code\":\"SAVE10\"}").unwrap();
        }

        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get(keys::CART).unwrap().as_deref(), Some("[]"));
        assert_eq!(
            storage.get(keys::PROMO).unwrap().as_deref(),
            Some("{\"code\":\"SAVE10\"}")
        );

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_file_storage_remove_persists() {
        let path = temp_state_file();

        let storage = FileStorage::open(&path).unwrap();
        storage.set(keys::USER, "{}").unwrap();
        storage.remove(keys::USER).unwrap();
        drop(storage);

        let storage = FileStorage::open(&path).unwrap();
        assert!(storage.get(keys::USER).unwrap().is_none());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_file_storage_creates_parent_directory() {
        let dir = std::env::temp_dir().join(format!("cartwheel-test-{}", uuid::Uuid::new_v4()));
        let path = dir.join("state.json");

        let storage = FileStorage::open(&path).unwrap();
        storage.set(keys::TOKEN, "t").unwrap();
        assert!(path.exists());

        let _ = fs::remove_dir_all(&dir);
    }
}
