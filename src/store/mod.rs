//! Core `Store` type owning the bookmark collection and its datastore file.

pub mod lifecycle;
pub mod mutation;
pub mod tags;

use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::StoreConfig;
use crate::history::History;
use crate::types::{Bookmark, BookmarkId, HistoryEntry};

pub use mutation::{ImportOptions, ImportSummary};

/// In-memory bookmark collection loaded from one datastore envelope.
///
/// A store is loaded per request for a caller that is either authenticated
/// or anonymous. Mutations only touch memory; [`Store::persist`] writes the
/// whole collection back and then hands queued history events to the
/// configured [`History`] sink.
pub struct Store {
    pub(crate) path: PathBuf,
    pub(crate) config: StoreConfig,
    pub(crate) authenticated: bool,
    /// Insertion order.
    pub(crate) bookmarks: Vec<Bookmark>,
    pub(crate) index: HashMap<BookmarkId, usize>,
    /// Lowest id never handed out, including ids of deleted bookmarks.
    pub(crate) next_id: BookmarkId,
    pub(crate) history: Box<dyn History + Send>,
    pub(crate) pending_events: Vec<HistoryEntry>,
    pub(crate) dirty: bool,
}

impl Store {
    pub(crate) fn rebuild_index(&mut self) {
        self.index = self
            .bookmarks
            .iter()
            .enumerate()
            .map(|(slot, bookmark)| (bookmark.id(), slot))
            .collect();
    }
}
