//! Collection-wide tag rewrites.
//!
//! Each operation rewrites every bookmark carrying the target tag
//! (case-insensitive), stamps it updated and queues one `UPDATED` history
//! event per affected bookmark. Nothing is written until the next persist.

use chrono::Utc;

use super::Store;
use crate::types::{Bookmark, HistoryEntry, HistoryEventKind};
use crate::{LinkshelfError, Result};

impl Store {
    /// Rename `from` to `to` everywhere. Bookmarks that already carry `to`
    /// end up with a single copy. An empty `to` deletes the tag. Returns the
    /// number of bookmarks changed.
    pub fn rename_tag(&mut self, from: &str, to: &str) -> Result<usize> {
        let to = to.trim();
        if to.is_empty() {
            return self.delete_tag(from);
        }
        if to.chars().any(char::is_whitespace) {
            return Err(LinkshelfError::invalid_bookmark(format!(
                "tag {to:?} contains whitespace"
            )));
        }
        let to = to.strip_prefix('-').unwrap_or(to);
        let changed = self.rewrite_tags(from, |bookmark| bookmark.rename_tag(from, to))?;
        tracing::info!(tag.from = from, tag.to = to, bookmarks = changed, "tag renamed");
        Ok(changed)
    }

    /// Fold `from` into the existing tag `into`.
    pub fn merge_tag(&mut self, from: &str, into: &str) -> Result<usize> {
        if into.trim().is_empty() {
            return Err(LinkshelfError::invalid_bookmark("merge target tag is empty"));
        }
        self.rename_tag(from, into)
    }

    /// Remove `tag` from every bookmark.
    pub fn delete_tag(&mut self, tag: &str) -> Result<usize> {
        let changed = self.rewrite_tags(tag, |bookmark| bookmark.delete_tag(tag))?;
        tracing::info!(tag = tag, bookmarks = changed, "tag deleted");
        Ok(changed)
    }

    fn rewrite_tags<F>(&mut self, tag: &str, mut rewrite: F) -> Result<usize>
    where
        F: FnMut(&mut Bookmark) -> bool,
    {
        self.ensure_writable()?;
        if tag.trim().is_empty() {
            return Ok(0);
        }
        let now = Utc::now();
        let mut touched = Vec::new();
        for bookmark in &mut self.bookmarks {
            if bookmark.has_tag(tag) && rewrite(bookmark) {
                bookmark.touch(now);
                touched.push(bookmark.id());
            }
        }
        let changed = touched.len();
        for id in touched {
            self.queue_event(HistoryEntry::new(HistoryEventKind::Updated, Some(id)));
        }
        Ok(changed)
    }
}
