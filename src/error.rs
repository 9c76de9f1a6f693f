use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, LinkshelfError>;

/// Error type returned by every fallible store, filter and updater operation.
#[derive(Debug, Error)]
pub enum LinkshelfError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("datastore is corrupt: {reason}")]
    CorruptStore { reason: Box<str> },

    #[error("failed to encode datastore payload: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("failed to decode datastore payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("datastore may be concurrently accessed: lock on {path:?} not acquired within {waited_ms} ms")]
    LockTimeout { path: PathBuf, waited_ms: u64 },

    #[error("not enough disk space to save the datastore ({required} bytes required, {available} available)")]
    NotEnoughSpace { required: u64, available: u64 },

    #[error("invalid bookmark: {reason}")]
    InvalidBookmark { reason: Box<str> },

    #[error("bookmark {0} not found")]
    BookmarkNotFound(u64),

    #[error("not authorized to alter the datastore")]
    NotAuthorized,

    #[error("invalid date {input:?}: expected YYYYMMDD")]
    InvalidDate { input: String },

    #[error("migration {name} failed: {source}")]
    Migration {
        name: &'static str,
        /// Migrations that completed earlier in the same run.
        completed: Vec<String>,
        #[source]
        source: Box<LinkshelfError>,
    },

    #[error("configuration error: {reason}")]
    Config { reason: Box<str> },

    #[error("history log error: {reason}")]
    History { reason: Box<str> },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LinkshelfError {
    pub(crate) fn corrupt(reason: impl Into<Box<str>>) -> Self {
        Self::CorruptStore {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_bookmark(reason: impl Into<Box<str>>) -> Self {
        Self::InvalidBookmark {
            reason: reason.into(),
        }
    }

    /// True for conditions the caller may log and move past.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::LockTimeout { .. })
    }
}
