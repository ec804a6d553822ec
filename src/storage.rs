//! Durable storage
//!
//! Key-value persistence outliving a single session. Writes are synchronous;
//! once a mutating store operation returns, a reload sees its effect.

use std::{fs, io, path::PathBuf};

use rustc_hash::FxHashMap;
use thiserror::Error;

/// Well-known storage keys.
pub mod keys {
    /// Serialized cart line items.
    pub const CART: &str = "cart";

    /// Serialized order history.
    pub const ORDERS: &str = "orders";

    /// Login flag.
    pub const IS_LOGGED_IN: &str = "isLoggedIn";

    /// Serialized signed-in user.
    pub const CURRENT_USER: &str = "currentUser";
}

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying file IO failed.
    #[error("storage io error: {0}")]
    Io(#[from] io::Error),

    /// The backing file held malformed data.
    #[error("storage encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Synchronous key-value persistence.
pub trait Storage {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any prior value.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the write does not complete.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key` if present.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the write does not complete.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory storage; durable only for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: FxHashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// File-backed storage: one JSON object per file, rewritten in full on every
/// mutation.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: FxHashMap<String, String>,
}

impl JsonFileStore {
    /// Open a store, loading existing entries when the file exists.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Io`]: the file exists but could not be read.
    /// - [`StorageError::Json`]: the file held malformed JSON.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => FxHashMap::default(),
            Err(err) => return Err(StorageError::Io(err)),
        };

        Ok(Self { path, entries })
    }

    fn flush(&self) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&self.entries)?;
        fs::write(&self.path, raw)?;

        Ok(())
    }
}

impl Storage for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }

        Ok(())
    }
}
