//! Record-level reads and writes on a loaded [`Store`].

use chrono::{NaiveDate, Utc};

use super::Store;
use crate::types::{
    Bookmark, BookmarkDraft, BookmarkId, HistoryEntry, HistoryEventKind, SearchRequest,
    SearchResult, TagCount, Visibility,
};
use crate::{LinkshelfError, Result};

/// How [`Store::import`] treats entries whose url is already stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Replace the stored bookmark instead of skipping the entry.
    pub overwrite: bool,
    /// Force every imported bookmark private.
    pub force_private: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub overwritten: usize,
    pub skipped: usize,
}

impl Store {
    /// Next id to hand out: one past the highest id ever allocated, or `0`
    /// for a fresh store.
    #[must_use]
    pub fn allocate_id(&self) -> BookmarkId {
        self.bookmarks
            .iter()
            .map(|bookmark| bookmark.id().saturating_add(1))
            .max()
            .unwrap_or(0)
            .max(self.next_id)
    }

    /// Add a new bookmark and return its id.
    pub fn create(&mut self, draft: BookmarkDraft) -> Result<BookmarkId> {
        self.ensure_writable()?;
        let id = self.allocate_id();
        let mut bookmark = Bookmark::from_draft(draft, id, Utc::now());
        bookmark.validate()?;
        self.insert(bookmark);
        tracing::debug!(bookmark.id = id, "bookmark created");
        Ok(id)
    }

    fn insert(&mut self, bookmark: Bookmark) {
        let id = bookmark.id();
        self.index.insert(id, self.bookmarks.len());
        self.bookmarks.push(bookmark);
        self.next_id = self.next_id.max(id.saturating_add(1));
        self.queue_event(HistoryEntry::new(HistoryEventKind::Created, Some(id)));
    }

    /// Replace a stored bookmark. Id, short id and creation time are kept
    /// from the stored record; `updated_at` is set to now.
    pub fn update(&mut self, mut bookmark: Bookmark) -> Result<()> {
        self.ensure_writable()?;
        let slot = self.slot(bookmark.id())?;
        bookmark.inherit_identity(&self.bookmarks[slot]);
        bookmark.touch(Utc::now());
        bookmark.validate()?;
        let id = bookmark.id();
        self.bookmarks[slot] = bookmark;
        self.queue_event(HistoryEntry::new(HistoryEventKind::Updated, Some(id)));
        tracing::debug!(bookmark.id = id, "bookmark updated");
        Ok(())
    }

    /// Remove a bookmark. Its id is never reissued.
    pub fn delete(&mut self, id: BookmarkId) -> Result<Bookmark> {
        self.ensure_writable()?;
        let slot = self.slot(id)?;
        let removed = self.bookmarks.remove(slot);
        self.rebuild_index();
        self.queue_event(HistoryEntry::new(HistoryEventKind::Deleted, Some(id)));
        tracing::debug!(bookmark.id = id, "bookmark deleted");
        Ok(removed)
    }

    fn slot(&self, id: BookmarkId) -> Result<usize> {
        self.index
            .get(&id)
            .copied()
            .ok_or(LinkshelfError::BookmarkNotFound(id))
    }

    /// Fetch a bookmark. Anonymous callers get `NotAuthorized` for private
    /// ones.
    pub fn get_by_id(&self, id: BookmarkId) -> Result<&Bookmark> {
        let bookmark = &self.bookmarks[self.slot(id)?];
        if bookmark.private && !self.authenticated {
            return Err(LinkshelfError::NotAuthorized);
        }
        Ok(bookmark)
    }

    /// Every bookmark the caller may see, in stored order.
    #[must_use]
    pub fn get_all(&self) -> Vec<&Bookmark> {
        self.bookmarks
            .iter()
            .filter(|bookmark| self.authenticated || !bookmark.private)
            .collect()
    }

    /// Whether `id` exists and passes `visibility` (caller default when
    /// `None`).
    #[must_use]
    pub fn exists(&self, id: BookmarkId, visibility: Option<Visibility>) -> bool {
        let visibility = visibility.unwrap_or(if self.authenticated {
            Visibility::All
        } else {
            Visibility::Public
        });
        self.index
            .get(&id)
            .is_some_and(|&slot| visibility.admits(self.bookmarks[slot].private))
    }

    #[must_use]
    pub fn count(&self, visibility: Option<Visibility>) -> usize {
        self.filter()
            .search(&SearchRequest {
                visibility,
                ..SearchRequest::default()
            })
            .total_count()
    }

    /// Most recently created visible bookmark.
    #[must_use]
    pub fn latest(&self) -> Option<&Bookmark> {
        self.filter()
            .search(&SearchRequest::default())
            .into_bookmarks()
            .into_iter()
            .next()
    }

    #[must_use]
    pub fn find_by_url(&self, url: &str) -> Option<&Bookmark> {
        let url = url.trim();
        self.bookmarks
            .iter()
            .find(|bookmark| bookmark.url == url)
            .filter(|bookmark| self.authenticated || !bookmark.private)
    }

    #[must_use]
    pub fn find_by_short_id(&self, short_id: &str) -> Option<&Bookmark> {
        self.filter().find_by_short_id(short_id)
    }

    #[must_use]
    pub fn search(&self, request: &SearchRequest) -> SearchResult<'_> {
        self.filter().search(request)
    }

    /// One page of `request`, sized by `general.links_per_page`. Pages are
    /// 1-based; page 0 is treated as the first.
    #[must_use]
    pub fn search_page(&self, request: &SearchRequest, page: usize) -> SearchResult<'_> {
        let per_page = self.config.general.links_per_page.max(1);
        let offset = page.saturating_sub(1).saturating_mul(per_page);
        self.search(request).page(offset, Some(per_page))
    }

    #[must_use]
    pub fn days(&self) -> Vec<NaiveDate> {
        self.filter().days()
    }

    /// Tag frequencies; see [`crate::FilterEngine::tag_counts`].
    #[must_use]
    pub fn bookmarks_count_per_tag(
        &self,
        subset: Option<&str>,
        visibility: Option<Visibility>,
    ) -> Vec<TagCount> {
        self.filter().tag_counts(subset, visibility)
    }

    /// Bulk-add already parsed entries. One `IMPORT` history event covers the
    /// whole batch instead of per-bookmark events.
    ///
    /// The batch is applied to a staged copy; an invalid entry fails the
    /// import and leaves the store untouched.
    pub fn import<I>(&mut self, entries: I, options: ImportOptions) -> Result<ImportSummary>
    where
        I: IntoIterator<Item = BookmarkDraft>,
    {
        self.ensure_writable()?;
        let now = Utc::now();
        let mut summary = ImportSummary::default();
        let mut staged = self.bookmarks.clone();
        let mut next_id = self.allocate_id();
        for mut draft in entries {
            if options.force_private {
                draft.private = true;
            }
            let url = draft.url.trim();
            let existing = if url.is_empty() {
                None
            } else {
                staged.iter().position(|bookmark| bookmark.url == url)
            };
            match existing {
                Some(_) if !options.overwrite => summary.skipped += 1,
                Some(slot) => {
                    let stored = &staged[slot];
                    let mut replacement = Bookmark::from_draft(draft, stored.id(), now);
                    replacement.inherit_identity(stored);
                    replacement.touch(now);
                    replacement.validate()?;
                    staged[slot] = replacement;
                    summary.overwritten += 1;
                }
                None => {
                    let mut bookmark = Bookmark::from_draft(draft, next_id, now);
                    bookmark.validate()?;
                    staged.push(bookmark);
                    next_id = next_id.saturating_add(1);
                    summary.imported += 1;
                }
            }
        }
        if summary.imported + summary.overwritten > 0 {
            self.bookmarks = staged;
            self.next_id = self.next_id.max(next_id);
            self.rebuild_index();
            self.queue_event(HistoryEntry::new(HistoryEventKind::Import, None));
        }
        tracing::info!(
            import.imported = summary.imported,
            import.overwritten = summary.overwritten,
            import.skipped = summary.skipped,
            "bookmarks imported"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use tempfile::TempDir;

    fn store(dir: &TempDir, authenticated: bool) -> Store {
        let config = StoreConfig::builder().data_dir(dir.path()).build().unwrap();
        Store::load(&config, authenticated).unwrap()
    }

    fn draft(url: &str) -> BookmarkDraft {
        BookmarkDraft::builder().url(url).build()
    }

    #[test]
    fn deleted_maximum_is_not_reissued() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir, true);
        assert_eq!(store.create(draft("https://a.example")).unwrap(), 0);
        let last = store.create(draft("https://b.example")).unwrap();
        store.delete(last).unwrap();
        assert_eq!(store.allocate_id(), 2);
        assert_eq!(store.create(draft("https://c.example")).unwrap(), 2);
    }

    #[test]
    fn update_keeps_identity_and_stamps_time() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir, true);
        let id = store.create(draft("https://a.example")).unwrap();
        let original = store.get_by_id(id).unwrap().clone();

        let mut edited = original.clone();
        edited.title = "Edited".into();
        edited.set_tags_str("one two");
        store.update(edited).unwrap();

        let stored = store.get_by_id(id).unwrap();
        assert_eq!(stored.title, "Edited");
        assert_eq!(stored.short_id(), original.short_id());
        assert_eq!(stored.created_at(), original.created_at());
        assert!(stored.updated_at().is_some());
    }

    #[test]
    fn unknown_ids_are_reported() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir, true);
        assert!(matches!(
            store.delete(7),
            Err(LinkshelfError::BookmarkNotFound(7))
        ));
        assert!(matches!(
            store.get_by_id(7),
            Err(LinkshelfError::BookmarkNotFound(7))
        ));
    }

    #[test]
    fn anonymous_callers_cannot_write() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir, false);
        assert!(matches!(
            store.create(draft("https://a.example")),
            Err(LinkshelfError::NotAuthorized)
        ));
    }

    #[test]
    fn import_skips_or_overwrites_known_urls() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir, true);
        store.create(draft("https://a.example")).unwrap();

        let batch = || {
            vec![
                BookmarkDraft::builder()
                    .url("https://a.example")
                    .title("Replaced")
                    .build(),
                draft("https://b.example"),
            ]
        };
        let summary = store.import(batch(), ImportOptions::default()).unwrap();
        assert_eq!((summary.imported, summary.skipped), (1, 1));
        assert_eq!(
            store.find_by_url("https://a.example").unwrap().title,
            "https://a.example"
        );

        let summary = store
            .import(
                batch(),
                ImportOptions {
                    overwrite: true,
                    force_private: true,
                },
            )
            .unwrap();
        assert_eq!(summary.overwritten, 2);
        let replaced = store.find_by_url("https://a.example").unwrap();
        assert_eq!(replaced.title, "Replaced");
        assert!(replaced.private);
        assert_eq!(replaced.id(), 0);

        let imports = store
            .pending_history()
            .iter()
            .filter(|event| event.event == HistoryEventKind::Import)
            .count();
        assert_eq!(imports, 2);
    }

    #[test]
    fn invalid_entry_leaves_the_store_untouched() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir, true);
        store.create(draft("https://a.example")).unwrap();
        store.persist().unwrap();

        let batch = vec![
            draft("https://ok.example"),
            BookmarkDraft::builder()
                .url("https://a.example")
                .title("Replaced")
                .build(),
            BookmarkDraft::builder().short_id("").build(),
        ];
        let options = ImportOptions {
            overwrite: true,
            force_private: false,
        };
        assert!(matches!(
            store.import(batch, options),
            Err(LinkshelfError::InvalidBookmark { .. })
        ));
        assert_eq!(store.count(None), 1);
        assert!(store.find_by_url("https://ok.example").is_none());
        assert_eq!(
            store.find_by_url("https://a.example").unwrap().title,
            "https://a.example"
        );
        assert!(!store.is_dirty());
        assert!(store.pending_history().is_empty());
        assert_eq!(store.allocate_id(), 1);
    }

    #[test]
    fn visibility_helpers_follow_the_caller() {
        let dir = TempDir::new().unwrap();
        let mut owner = store(&dir, true);
        owner.create(draft("https://public.example")).unwrap();
        let secret = owner
            .create(
                BookmarkDraft::builder()
                    .url("https://private.example")
                    .private(true)
                    .build(),
            )
            .unwrap();
        owner.persist().unwrap();
        assert_eq!(owner.count(None), 2);
        assert!(owner.exists(secret, None));
        assert!(!owner.exists(secret, Some(Visibility::Public)));

        let visitor = store(&dir, false);
        assert_eq!(visitor.count(None), 1);
        assert!(!visitor.exists(secret, None));
        assert!(matches!(
            visitor.get_by_id(secret),
            Err(LinkshelfError::NotAuthorized)
        ));
        assert_eq!(visitor.get_all().len(), 1);
        assert!(visitor.find_by_url("https://private.example").is_none());
    }
}
