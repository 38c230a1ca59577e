//! Advisory locking for a storage directory.
//!
//! Readers share the lock, a writer holds it alone. The lock lives in a
//! sidecar file so the data files themselves can be replaced by rename while
//! it is held.

use crate::error::ErrorCode;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// Pause between attempts while another process holds the lock.
const RETRY_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// Another process kept the lock for longer than we were willing to wait.
    #[error("{} stayed locked for {waited:?}", path.display())]
    Contended { path: PathBuf, waited: Duration },

    #[error("cannot open lock file: {0}")]
    Io(#[from] io::Error),
}

impl LockError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Contended { .. } => ErrorCode::LockContention,
            Self::Io(_) => ErrorCode::StorageWriteFailed,
        }
    }
}

/// How the lock is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Any number of readers at once.
    Shared,
    /// One writer, no readers.
    Exclusive,
}

/// A held lock; released on drop.
#[derive(Debug)]
pub struct DirLock {
    file: File,
    mode: LockMode,
}

impl DirLock {
    /// Take the lock at `path` in `mode`, retrying until `timeout` elapses.
    ///
    /// # Errors
    ///
    /// [`LockError::Contended`] if the lock could not be taken in time, or
    /// [`LockError::Io`] if the lock file cannot be created.
    pub fn acquire(path: &Path, mode: LockMode, timeout: Duration) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        let started = Instant::now();
        loop {
            let attempt = match mode {
                LockMode::Shared => FileExt::try_lock_shared(&file),
                LockMode::Exclusive => FileExt::try_lock_exclusive(&file),
            };
            if attempt.is_ok() {
                tracing::trace!(path = %path.display(), ?mode, "lock taken");
                return Ok(Self { file, mode });
            }

            let waited = started.elapsed();
            if waited >= timeout {
                return Err(LockError::Contended {
                    path: path.to_path_buf(),
                    waited,
                });
            }
            thread::sleep(RETRY_INTERVAL);
        }
    }

    /// Shorthand for a [`LockMode::Shared`] lock.
    ///
    /// # Errors
    ///
    /// See [`DirLock::acquire`].
    pub fn shared(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Self::acquire(path, LockMode::Shared, timeout)
    }

    /// Shorthand for a [`LockMode::Exclusive`] lock.
    ///
    /// # Errors
    ///
    /// See [`DirLock::acquire`].
    pub fn exclusive(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Self::acquire(path, LockMode::Exclusive, timeout)
    }

    #[must_use]
    pub const fn mode(&self) -> LockMode {
        self.mode
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
