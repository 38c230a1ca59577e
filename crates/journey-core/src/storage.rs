//! Durable key/value storage for progress blobs.
//!
//! The engine persists whole serialized records under well-known keys, the
//! way a browser page would use local storage. [`FileStorage`] keeps one file
//! per key inside a directory; [`MemoryStorage`] keeps values in a shared map
//! and can simulate a quota or disabled storage.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::error::ErrorCode;
use crate::lock::{DirLock, LockError};

/// Default wait for the storage lock before giving up.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(500);

/// Errors raised by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Filesystem error while touching a key.
    #[error("storage I/O error for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },

    /// Writing the value would exceed the backend's capacity.
    #[error("storage quota exceeded writing '{key}': need {needed} bytes, quota is {quota}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },

    /// Could not take the storage lock.
    #[error("{0}")]
    Lock(#[from] LockError),

    /// The backend refuses all access.
    #[error("storage is disabled")]
    Disabled,

    /// Key contains characters the backend cannot store.
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
}

impl StorageError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } | Self::InvalidKey(_) => ErrorCode::StorageWriteFailed,
            Self::QuotaExceeded { .. } => ErrorCode::StorageQuotaExceeded,
            Self::Lock(err) => err.code(),
            Self::Disabled => ErrorCode::StorageDisabled,
        }
    }
}

/// A durable string store addressed by key.
pub trait Storage {
    /// Read the value under `key`, or `None` if nothing was stored.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value under `key`.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Read `key`, hand the current value to `merge`, and store what it
    /// returns, with no other writer able to slip in between. `None` from
    /// `merge` leaves the stored value as it was.
    fn update(
        &self,
        key: &str,
        merge: &mut dyn FnMut(Option<String>) -> Option<String>,
    ) -> Result<(), StorageError>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).write(key, value)
    }

    fn update(
        &self,
        key: &str,
        merge: &mut dyn FnMut(Option<String>) -> Option<String>,
    ) -> Result<(), StorageError> {
        (**self).update(key, merge)
    }
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    let ok = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
    if ok {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

// ---------------------------------------------------------------------------
// FileStorage
// ---------------------------------------------------------------------------

/// One JSON file per key under a directory.
///
/// Writes take an exclusive advisory lock on `<dir>/.lock` and replace the
/// file atomically (temp file + rename), so a concurrent reader sees either
/// the old or the new value, never a torn one.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    lock_timeout: Duration,
}

impl FileStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// How long a call waits for the directory lock.
    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Directory holding the stored files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that holds `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join(".lock")
    }

    fn io_err(key: &str) -> impl FnOnce(io::Error) -> StorageError + '_ {
        move |source| StorageError::Io {
            key: key.to_string(),
            source,
        }
    }

    /// Read the file for `key`. Caller holds the lock.
    fn read_locked(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Self::io_err(key)(err)),
        }
    }

    /// Replace the file for `key` via temp file and rename. Caller holds the
    /// exclusive lock.
    fn write_locked(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value).map_err(Self::io_err(key))?;
        fs::rename(&tmp, &path).map_err(Self::io_err(key))?;

        tracing::trace!(key, bytes = value.len(), path = %path.display(), "stored value");
        Ok(())
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        if !self.path_for(key).exists() {
            return Ok(None);
        }

        let _lock = DirLock::shared(&self.lock_path(), self.lock_timeout)?;
        self.read_locked(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        fs::create_dir_all(&self.dir).map_err(Self::io_err(key))?;

        let _lock = DirLock::exclusive(&self.lock_path(), self.lock_timeout)?;
        self.write_locked(key, value)
    }

    fn update(
        &self,
        key: &str,
        merge: &mut dyn FnMut(Option<String>) -> Option<String>,
    ) -> Result<(), StorageError> {
        validate_key(key)?;
        fs::create_dir_all(&self.dir).map_err(Self::io_err(key))?;

        let _lock = DirLock::exclusive(&self.lock_path(), self.lock_timeout)?;
        let current = self.read_locked(key)?;
        merge(current).map_or(Ok(()), |next| self.write_locked(key, &next))
    }
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// In-process storage. Clones share the same map, which lets two stores act
/// like two pages open on the same profile.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: Arc<Mutex<BTreeMap<String, String>>>,
    quota: Option<usize>,
    disabled: Arc<AtomicBool>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the total bytes (keys plus values) this storage will hold.
    #[must_use]
    pub const fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// Make every call fail with [`StorageError::Disabled`] (or succeed again).
    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::Relaxed);
    }

    fn check_enabled(&self) -> Result<(), StorageError> {
        if self.disabled.load(Ordering::Relaxed) {
            Err(StorageError::Disabled)
        } else {
            Ok(())
        }
    }

    fn check_quota(
        &self,
        values: &BTreeMap<String, String>,
        key: &str,
        value: &str,
    ) -> Result<(), StorageError> {
        let Some(quota) = self.quota else {
            return Ok(());
        };
        let others: usize = values
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum();
        let needed = others + key.len() + value.len();
        if needed > quota {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
                needed,
                quota,
            });
        }
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_enabled()?;
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_enabled()?;
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        self.check_quota(&values, key, value)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn update(
        &self,
        key: &str,
        merge: &mut dyn FnMut(Option<String>) -> Option<String>,
    ) -> Result<(), StorageError> {
        self.check_enabled()?;
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(next) = merge(values.get(key).cloned()) else {
            return Ok(());
        };
        self.check_quota(&values, key, &next)?;
        values.insert(key.to_string(), next);
        Ok(())
    }
}
