//! Loading and persisting the datastore envelope.
//!
//! Responsibilities:
//! - Treat a missing or empty datastore as a fresh, empty collection.
//! - Reject undecodable envelopes as corrupt instead of starting over.
//! - Write the whole collection atomically under the sidecar lock, after a
//!   free-space check on the target volume.
//! - Forward queued history events once the write succeeded.

use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use atomic_write_file::AtomicWriteFile;
use tracing::instrument;

use super::Store;
use crate::config::StoreConfig;
use crate::constants::DISK_SPACE_MARGIN_BYTES;
use crate::filter::FilterEngine;
use crate::history::{History, NoopHistory};
use crate::io::{EnvelopeCodec, StorePayload};
use crate::lock::{FileLock, LockTimeoutPolicy};
use crate::types::{BookmarkId, HistoryEntry};
use crate::{LinkshelfError, Result};

impl Store {
    /// Load the datastore named by `config` for an authenticated or
    /// anonymous caller.
    ///
    /// With `privacy.hide_public_links` set, an anonymous caller gets an
    /// empty store and the file is not read.
    pub fn load(config: &StoreConfig, authenticated: bool) -> Result<Self> {
        let path = config.datastore_path();
        let payload = if config.privacy.hide_public_links && !authenticated {
            tracing::debug!(store.path = %path.display(), "public links hidden, skipping datastore read");
            StorePayload::default()
        } else {
            read_payload(&path)?
        };

        let mut store = Self {
            path,
            config: config.clone(),
            authenticated,
            bookmarks: Vec::new(),
            index: HashMap::new(),
            next_id: 0,
            history: Box::new(NoopHistory),
            pending_events: Vec::new(),
            dirty: false,
        };
        store.install(payload)?;
        tracing::info!(
            store.path = %store.path.display(),
            store.bookmarks = store.bookmarks.len(),
            store.authenticated = authenticated,
            "datastore loaded"
        );
        Ok(store)
    }

    fn install(&mut self, payload: StorePayload) -> Result<()> {
        let StorePayload {
            next_id,
            bookmarks,
        } = payload;
        self.bookmarks = bookmarks;
        self.rebuild_index();
        if self.index.len() != self.bookmarks.len() {
            return Err(LinkshelfError::corrupt("duplicate bookmark ids in datastore"));
        }
        let past_max = self
            .bookmarks
            .iter()
            .map(|bookmark| bookmark.id().saturating_add(1))
            .max()
            .unwrap_or(0);
        self.next_id = next_id.max(past_max);
        Ok(())
    }

    /// Route history events to `history` from now on.
    #[must_use]
    pub fn with_history<H: History + Send + 'static>(mut self, history: H) -> Self {
        self.history = Box::new(history);
        self
    }

    pub fn set_history<H: History + Send + 'static>(&mut self, history: H) {
        self.history = Box::new(history);
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// True when in-memory changes have not been persisted yet.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read-only query engine over the current collection, honouring the
    /// caller's authentication and the configured default visibility.
    #[must_use]
    pub fn filter(&self) -> FilterEngine<'_> {
        FilterEngine::new(&self.bookmarks, self.authenticated)
            .with_default_visibility(self.config.general.default_visibility)
    }

    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        FileLock::lock_path_for(&self.path)
    }

    /// Write the whole collection to the datastore file.
    ///
    /// The lock is held only for the duration of the write. If it cannot be
    /// acquired within the configured timeout the write goes ahead unlocked
    /// (after a warning) unless the lock policy is `Fail`.
    #[instrument(
        target = "linkshelf::store",
        skip_all,
        fields(path = %self.path.display(), bookmarks = self.bookmarks.len())
    )]
    pub fn persist(&mut self) -> Result<()> {
        self.ensure_writable()?;
        let payload = StorePayload {
            next_id: self.next_id,
            bookmarks: self.bookmarks.clone(),
        };
        let bytes = EnvelopeCodec::encode(&payload)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;
        ensure_free_space(&dir, bytes.len())?;

        let lock_path = self.lock_path();
        let settings = &self.config.lock;
        let guard = FileLock::acquire(&lock_path, settings)?;
        if guard.is_none() {
            tracing::warn!(
                lock.path = %lock_path.display(),
                waited_ms = settings.timeout_ms,
                "datastore may be concurrently accessed"
            );
            if settings.on_timeout == LockTimeoutPolicy::Fail {
                return Err(LinkshelfError::LockTimeout {
                    path: lock_path,
                    waited_ms: settings.timeout_ms,
                });
            }
        }

        let mut file = AtomicWriteFile::open(&self.path)?;
        file.write_all(&bytes)?;
        file.commit()?;
        drop(guard);

        self.dirty = false;
        tracing::info!(bytes = bytes.len(), "datastore persisted");
        self.flush_history()
    }

    /// Forward every queued event; the first failure is returned after the
    /// rest have been offered.
    fn flush_history(&mut self) -> Result<()> {
        let events: Vec<HistoryEntry> = std::mem::take(&mut self.pending_events);
        let mut first_error = None;
        for event in events {
            if let Err(err) = self.history.record(event) {
                tracing::warn!(error = %err, "history event not recorded");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Events that will be recorded on the next successful persist.
    #[must_use]
    pub fn pending_history(&self) -> &[HistoryEntry] {
        &self.pending_events
    }

    pub(crate) fn ensure_writable(&self) -> Result<()> {
        if self.authenticated {
            Ok(())
        } else {
            Err(LinkshelfError::NotAuthorized)
        }
    }

    pub(crate) fn queue_event(&mut self, entry: HistoryEntry) {
        self.pending_events.push(entry);
        self.dirty = true;
    }

    #[must_use]
    pub fn next_id(&self) -> BookmarkId {
        self.next_id
    }
}

fn read_payload(path: &Path) -> Result<StorePayload> {
    match fs::read(path) {
        Ok(bytes) if bytes.is_empty() => {
            tracing::debug!(store.path = %path.display(), "datastore file empty, starting fresh");
            Ok(StorePayload::default())
        }
        Ok(bytes) => EnvelopeCodec::decode(&bytes),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::debug!(store.path = %path.display(), "datastore file missing, starting fresh");
            Ok(StorePayload::default())
        }
        Err(err) => Err(err.into()),
    }
}

fn ensure_free_space(dir: &Path, payload_len: usize) -> Result<()> {
    let required = u64::try_from(payload_len)
        .unwrap_or(u64::MAX)
        .saturating_add(DISK_SPACE_MARGIN_BYTES);
    let available = fs2::available_space(dir)?;
    if available < required {
        return Err(LinkshelfError::NotEnoughSpace {
            required,
            available,
        });
    }
    Ok(())
}
