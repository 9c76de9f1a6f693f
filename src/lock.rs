//! Exclusive sidecar lock guarding datastore writes.
//!
//! The lock lives in `<datastore>.lock` rather than on the datastore itself
//! because persist replaces the datastore file by rename.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::Result;
use crate::constants::{DEFAULT_LOCK_POLL_MS, DEFAULT_LOCK_TIMEOUT_MS, LOCK_FILE_SUFFIX};

/// What persist does when the lock cannot be acquired in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockTimeoutPolicy {
    /// Log a warning and write without the lock.
    #[default]
    Proceed,
    /// Return [`crate::LinkshelfError::LockTimeout`].
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LockSettings {
    pub timeout_ms: u64,
    pub poll_ms: u64,
    pub on_timeout: LockTimeoutPolicy,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            poll_ms: DEFAULT_LOCK_POLL_MS,
            on_timeout: LockTimeoutPolicy::Proceed,
        }
    }
}

/// Held exclusive lock; released on drop.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Sidecar lock path for a datastore.
    #[must_use]
    pub fn lock_path_for(datastore: &Path) -> PathBuf {
        let mut name = OsString::from(datastore.as_os_str());
        name.push(".");
        name.push(LOCK_FILE_SUFFIX);
        PathBuf::from(name)
    }

    /// Poll for the lock until `settings.timeout_ms` elapses. `Ok(None)`
    /// reports a timeout.
    pub fn acquire(lock_path: &Path, settings: &LockSettings) -> Result<Option<Self>> {
        let file = open_lock_file(lock_path)?;
        let deadline = Instant::now() + Duration::from_millis(settings.timeout_ms);
        let poll = Duration::from_millis(settings.poll_ms.max(1));
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    tracing::debug!(lock.path = %lock_path.display(), "datastore lock acquired");
                    return Ok(Some(Self {
                        file,
                        path: lock_path.to_path_buf(),
                    }));
                }
                Err(err) if is_contended(&err) => {
                    if Instant::now() >= deadline {
                        return Ok(None);
                    }
                    thread::sleep(poll);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            tracing::warn!(lock.path = %self.path.display(), "failed to release datastore lock: {err}");
        }
    }
}

fn open_lock_file(path: &Path) -> Result<File> {
    Ok(OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?)
}

fn is_contended(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lock_path_appends_suffix() {
        let path = FileLock::lock_path_for(Path::new("/data/datastore.bin"));
        assert_eq!(path, PathBuf::from("/data/datastore.bin.lock"));
    }

    #[test]
    fn second_holder_times_out_until_release() {
        let dir = TempDir::new().unwrap();
        let lock_path = dir.path().join("store.lock");
        let settings = LockSettings {
            timeout_ms: 30,
            poll_ms: 5,
            on_timeout: LockTimeoutPolicy::Fail,
        };

        let held = FileLock::acquire(&lock_path, &settings).unwrap();
        assert!(held.is_some());
        assert!(FileLock::acquire(&lock_path, &settings).unwrap().is_none());

        drop(held);
        let immediate = LockSettings {
            timeout_ms: 0,
            ..settings
        };
        assert!(FileLock::acquire(&lock_path, &immediate).unwrap().is_some());
    }
}
