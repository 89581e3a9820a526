//! Cart storage
//!
//! Key-value storage for serialized carts. The store writes through a [`CartStorage`] after
//! every mutation, so tests can use [`MemoryStorage`] while the CLI uses [`FileStorage`].

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::warn;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Key contains characters that cannot be used in a storage location.
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    /// IO error reading or writing a stored value
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        /// Location being accessed
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },
}

/// Key-value storage for serialized carts.
pub trait CartStorage {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the storage cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the storage cannot be written.
    fn save(&mut self, key: &str, payload: &str) -> Result<(), StorageError>;
}

/// In-memory storage that lives as long as the value does.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: FxHashMap<String, String>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage holding a single value.
    pub fn with_entry(key: impl Into<String>, payload: impl Into<String>) -> Self {
        let mut storage = Self::new();
        storage.entries.insert(key.into(), payload.into());

        storage
    }

    /// Borrow the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, payload: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), payload.to_string());

        Ok(())
    }
}

/// Stores each key as a JSON file in a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at `base_path`. The directory is created on first write.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Directory holding the stored files.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// File that holds the value for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] unless the key is non-empty ASCII alphanumerics,
    /// `-` or `_`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');

        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        Ok(self.base_path.join(format!("{key}.json")))
    }
}

impl CartStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;

        match fs::read_to_string(&path) {
            Ok(payload) => Ok(Some(payload)),
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn save(&mut self, key: &str, payload: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;

        fs::create_dir_all(&self.base_path).map_err(|source| StorageError::Io {
            path: self.base_path.clone(),
            source,
        })?;

        // Readers only ever see a complete payload.
        let staging = path.with_extension("json.tmp");

        fs::write(&staging, payload).map_err(|source| StorageError::Io {
            path: staging.clone(),
            source,
        })?;

        if let Err(source) = fs::rename(&staging, &path) {
            if let Err(error) = fs::remove_file(&staging) {
                warn!(%error, path = %staging.display(), "failed to remove staging file");
            }

            return Err(StorageError::Io { path, source });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn memory_storage_returns_none_for_missing_key() -> TestResult {
        let storage = MemoryStorage::new();

        assert_eq!(storage.load("cart")?, None);

        Ok(())
    }

    #[test]
    fn memory_storage_overwrites_values() -> TestResult {
        let mut storage = MemoryStorage::with_entry("cart", "[]");

        storage.save("cart", "{}")?;

        assert_eq!(storage.get("cart"), Some("{}"));

        Ok(())
    }

    #[test]
    fn file_storage_round_trips_and_creates_directory() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut storage = FileStorage::new(dir.path().join("nested"));

        assert_eq!(storage.load("cart")?, None);

        storage.save("cart", r#"{"items":[]}"#)?;

        assert_eq!(storage.load("cart")?.as_deref(), Some(r#"{"items":[]}"#));
        assert!(dir.path().join("nested").join("cart.json").exists());

        Ok(())
    }

    #[test]
    fn failed_rename_removes_the_staging_file() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut storage = FileStorage::new(dir.path());

        // A directory in the way makes the rename fail.
        fs::create_dir(dir.path().join("cart.json"))?;

        let result = storage.save("cart", r#"{"items":[]}"#);

        assert!(matches!(result, Err(StorageError::Io { .. })));
        assert!(!dir.path().join("cart.json.tmp").exists());

        Ok(())
    }

    #[test]
    fn file_storage_rejects_path_like_keys() {
        let storage = FileStorage::new("/tmp");

        assert!(matches!(
            storage.path_for("../cart"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(storage.path_for(""), Err(StorageError::InvalidKey(_))));
    }
}
