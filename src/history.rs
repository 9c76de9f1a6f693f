//! Append-only change log fed by store mutations.
//!
//! The store only depends on the [`History`] trait. [`HistoryLog`] keeps the
//! log in a JSON file, newest entry first, pruning entries older than the
//! retention window on each write. [`MemoryHistory`] keeps it in memory.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use atomic_write_file::AtomicWriteFile;
use chrono::{Duration, Utc};

use crate::config::StoreConfig;
use crate::constants::DEFAULT_HISTORY_RETENTION_SECS;
use crate::types::{Bookmark, HistoryEntry, HistoryEventKind};
use crate::{LinkshelfError, Result};

/// Sink for history events.
pub trait History {
    fn record(&mut self, entry: HistoryEntry) -> Result<()>;

    fn record_created(&mut self, bookmark: &Bookmark) -> Result<()> {
        self.record(HistoryEntry::new(
            HistoryEventKind::Created,
            Some(bookmark.id()),
        ))
    }

    fn record_updated(&mut self, bookmark: &Bookmark) -> Result<()> {
        self.record(HistoryEntry::new(
            HistoryEventKind::Updated,
            Some(bookmark.id()),
        ))
    }

    fn record_deleted(&mut self, bookmark: &Bookmark) -> Result<()> {
        self.record(HistoryEntry::new(
            HistoryEventKind::Deleted,
            Some(bookmark.id()),
        ))
    }

    fn record_import(&mut self) -> Result<()> {
        self.record(HistoryEntry::new(HistoryEventKind::Import, None))
    }

    fn record_settings_change(&mut self) -> Result<()> {
        self.record(HistoryEntry::new(HistoryEventKind::Settings, None))
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHistory;

impl History for NoopHistory {
    fn record(&mut self, _entry: HistoryEntry) -> Result<()> {
        Ok(())
    }
}

/// In-memory history. Clones share the same buffer, so a caller can keep a
/// handle after boxing one into a store.
#[derive(Debug, Default, Clone)]
pub struct MemoryHistory {
    entries: Arc<Mutex<Vec<HistoryEntry>>>,
}

impl MemoryHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot, newest first.
    #[must_use]
    pub fn entries(&self) -> Vec<HistoryEntry> {
        match self.entries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    #[must_use]
    pub fn count(&self, event: HistoryEventKind) -> usize {
        self.entries()
            .iter()
            .filter(|entry| entry.event == event)
            .count()
    }
}

impl History for MemoryHistory {
    fn record(&mut self, entry: HistoryEntry) -> Result<()> {
        let mut guard = self.entries.lock().map_err(|_| LinkshelfError::History {
            reason: "history buffer poisoned".into(),
        })?;
        guard.insert(0, entry);
        Ok(())
    }
}

/// JSON-file history log.
#[derive(Debug)]
pub struct HistoryLog {
    path: PathBuf,
    retention: Duration,
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    /// Open the log at `path`, creating an empty one if it does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_retention(path, Duration::seconds(DEFAULT_HISTORY_RETENTION_SECS))
    }

    pub fn open_with_retention<P: AsRef<Path>>(path: P, retention: Duration) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|err| LinkshelfError::History {
                    reason: format!("could not parse history file {}: {err}", path.display())
                        .into(),
                })?
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };
        let mut log = Self {
            path,
            retention,
            entries,
        };
        if !log.path.exists() {
            log.write()?;
        }
        Ok(log)
    }

    /// Open the log named by the configuration, with its retention window.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::open_with_retention(config.history_path(), config.history_retention())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries, newest first.
    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    fn write(&mut self) -> Result<()> {
        let cutoff = Utc::now() - self.retention;
        self.entries.retain(|entry| entry.datetime >= cutoff);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(&self.entries)?;
        let mut file = AtomicWriteFile::open(&self.path)?;
        file.write_all(&json)?;
        file.commit()?;
        Ok(())
    }
}

impl History for HistoryLog {
    fn record(&mut self, entry: HistoryEntry) -> Result<()> {
        self.entries.insert(0, entry);
        self.write()
    }
}
