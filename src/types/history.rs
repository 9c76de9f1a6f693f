use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bookmark::BookmarkId;

/// Kind of change recorded in the history log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryEventKind {
    Created,
    Updated,
    Deleted,
    Import,
    Settings,
}

/// One history log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub event: HistoryEventKind,
    pub datetime: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<BookmarkId>,
}

impl HistoryEntry {
    #[must_use]
    pub fn new(event: HistoryEventKind, id: Option<BookmarkId>) -> Self {
        Self {
            event,
            datetime: Utc::now(),
            id,
        }
    }
}
