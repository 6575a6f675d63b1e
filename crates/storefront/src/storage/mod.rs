//! Persistent key/value storage.
//!
//! # Architecture
//!
//! - [`KeyValueStore`] is the string-keyed, string-valued backend every
//!   service persists through. All operations are synchronous.
//! - [`StorageExt`] layers JSON (de)serialization on top of any backend.
//! - [`MemoryStorage`] models an origin-wide storage area shared by several
//!   browsing contexts, each with its own [`StorageContext`] handle. Writes
//!   from one context are announced to the others through a [`ChangeFeed`].
//! - [`FileStorage`] keeps one JSON document per key in a directory.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::{
    ChangeFeed, ContextId, DEFAULT_QUOTA_BYTES, FeedItem, MemoryStorage, StorageContext,
    StorageEvent,
};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Whether `key` can be stored by every backend: non-empty ASCII letters,
/// digits, `_` and `-`.
#[must_use]
pub fn is_portable_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Writing the value would exceed the storage quota.
    #[error("quota exceeded writing {key}: {required} bytes required, quota is {quota}")]
    QuotaExceeded {
        key: String,
        required: usize,
        quota: usize,
    },

    /// Key cannot be stored by this backend.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while persisting or restoring typed values.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Backend read or write failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Value could not be encoded.
    #[error("failed to serialize {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Stored value is not valid JSON for the requested type.
    #[error("failed to deserialize {key}: {source}")]
    Deserialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A string-keyed, string-valued persistent store.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write is rejected; the previous value is
    /// left untouched in that case.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Remove every key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn clear(&self) -> Result<(), StorageError>;
}

/// JSON helpers available on every [`KeyValueStore`].
pub trait StorageExt: KeyValueStore {
    /// Serialize `value` as JSON and store it under `key`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if serialization or the write fails.
    fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), PersistenceError> {
        let raw = serde_json::to_string(value).map_err(|source| PersistenceError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.set_item(key, &raw)?;
        Ok(())
    }

    /// Load and deserialize the JSON value stored under `key`.
    ///
    /// An absent key and an empty stored string both load as `None`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the read fails or the value is corrupt.
    fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PersistenceError> {
        let Some(raw) = self.get_item(key)? else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| PersistenceError::Deserialize {
                key: key.to_string(),
                source,
            })
    }

    /// Load the value under `key`, falling back to `default` when it is
    /// absent or cannot be restored. Failures are logged.
    fn load_json_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.load_json(key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to load from storage, using default");
                default
            }
        }
    }
}

impl<S: KeyValueStore + ?Sized> StorageExt for S {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_json() {
        let storage = MemoryStorage::new().context();
        storage.save_json("numbers", &vec![1, 2, 3]).unwrap();

        let loaded: Option<Vec<i32>> = storage.load_json("numbers").unwrap();
        assert_eq!(loaded, Some(vec![1, 2, 3]));
        assert_eq!(storage.get_item("numbers").unwrap().as_deref(), Some("[1,2,3]"));
    }

    #[test]
    fn test_load_json_absent_and_empty() {
        let storage = MemoryStorage::new().context();
        assert_eq!(storage.load_json::<Vec<i32>>("missing").unwrap(), None);

        storage.set_item("blank", "").unwrap();
        assert_eq!(storage.load_json::<Vec<i32>>("blank").unwrap(), None);
    }

    #[test]
    fn test_portable_keys() {
        assert!(is_portable_key("zapaStyle_cart"));
        assert!(is_portable_key("cart-v2"));
        for key in ["", "a/b", "with space", "../up", "caf\u{e9}"] {
            assert!(!is_portable_key(key), "{key:?} should be rejected");
        }
    }

    #[test]
    fn test_load_json_corrupt_is_error() {
        let storage = MemoryStorage::new().context();
        storage.set_item("broken", "{not json").unwrap();

        let err = storage.load_json::<Vec<i32>>("broken").unwrap_err();
        assert!(matches!(err, PersistenceError::Deserialize { ref key, .. } if key == "broken"));
    }

    #[test]
    fn test_load_json_or_falls_back_on_corruption() {
        let storage = MemoryStorage::new().context();
        storage.set_item("broken", "[1, 2,").unwrap();

        let loaded: Vec<i32> = storage.load_json_or("broken", vec![9]);
        assert_eq!(loaded, vec![9]);
    }

    #[test]
    fn test_save_json_surfaces_quota_errors() {
        let storage = MemoryStorage::with_quota(8).context();
        let err = storage.save_json("key", "a long value").unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::Storage(StorageError::QuotaExceeded { .. })
        ));
    }
}
