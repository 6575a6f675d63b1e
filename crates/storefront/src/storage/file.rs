//! Directory-backed storage: one file per key.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{DEFAULT_QUOTA_BYTES, KeyValueStore, StorageError, is_portable_key};

const FILE_EXTENSION: &str = "json";

/// Stores each key as `<key>.json` inside a directory.
///
/// Keys may only contain ASCII letters, digits, `_` and `-`; anything else
/// is rejected rather than silently mapped onto another key's file. Keys
/// plus values are limited to a quota, counted the same way as
/// [`super::MemoryStorage`].
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    quota: usize,
}

impl FileStorage {
    /// Open (creating if needed) a storage directory.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        tracing::debug!(dir = %dir.display(), "Opened file storage");
        Ok(Self {
            dir,
            quota: DEFAULT_QUOTA_BYTES,
        })
    }

    /// Limit stored keys plus values to `quota` bytes.
    #[must_use]
    pub const fn with_quota(mut self, quota: usize) -> Self {
        self.quota = quota;
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if !is_portable_key(key) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.{FILE_EXTENSION}")))
    }

    /// Bytes used by every stored entry except `skip`.
    fn used_bytes_except(&self, skip: &str) -> Result<usize, StorageError> {
        let mut used = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_none_or(|ext| ext != FILE_EXTENSION) {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if key == skip {
                continue;
            }
            let len = usize::try_from(fs::metadata(&path)?.len()).unwrap_or(usize::MAX);
            used = key.len().saturating_add(len).saturating_add(used);
        }
        Ok(used)
    }
}

impl KeyValueStore for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let required = self
            .used_bytes_except(key)?
            .saturating_add(key.len() + value.len());
        if required > self.quota {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
                required,
                quota: self.quota,
            });
        }

        // Write then rename so readers never observe a half-written value
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> Result<(), StorageError> {
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == FILE_EXTENSION) {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}
