//! Public types exposed by the `linkshelf-core` crate.

pub mod bookmark;
pub mod history;
pub mod search;

pub use bookmark::{
    Bookmark, BookmarkDraft, BookmarkDraftBuilder, BookmarkId, ExtraValue, short_id_for,
};
pub use history::{HistoryEntry, HistoryEventKind};
pub use search::{SearchRequest, SearchResult, TagCount, Visibility, parse_day};
