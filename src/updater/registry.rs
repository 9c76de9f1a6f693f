//! Built-in data migrations, in execution order.

use chrono::Utc;

use crate::Result;
use crate::constants::SEARCH_HIGHLIGHT_KEY;
use crate::store::Store;
use crate::types::{Bookmark, short_id_for};

use super::Migration;

#[must_use]
pub fn builtin_migrations() -> Vec<Migration> {
    vec![
        Migration::new("strip_dash_tags", strip_dash_tags),
        Migration::new("backfill_short_ids", backfill_short_ids),
        Migration::new("drop_search_highlight", drop_search_highlight),
        Migration::new("normalize_note_urls", normalize_note_urls),
    ]
}

/// Apply `rewrite` to every bookmark, touching the ones it changed, and
/// persist if anything changed.
fn rewrite_each<F>(store: &mut Store, mut rewrite: F) -> Result<usize>
where
    F: FnMut(&mut Bookmark) -> bool,
{
    let now = Utc::now();
    let mut changed = 0;
    for bookmark in &mut store.bookmarks {
        if rewrite(bookmark) {
            bookmark.touch(now);
            changed += 1;
        }
    }
    if changed > 0 {
        store.dirty = true;
        store.persist()?;
    }
    Ok(changed)
}

/// Tags are stored without a leading dash, which would read as an exclusion
/// in tag queries.
fn strip_dash_tags(store: &mut Store) -> Result<bool> {
    let changed = rewrite_each(store, |bookmark| {
        if !bookmark.tags().iter().any(|tag| tag.starts_with('-')) {
            return false;
        }
        let tags = bookmark.tags().to_vec();
        bookmark.set_tags(tags);
        true
    })?;
    tracing::debug!(bookmarks = changed, "dash-prefixed tags stripped");
    Ok(true)
}

fn backfill_short_ids(store: &mut Store) -> Result<bool> {
    rewrite_each(store, |bookmark| {
        if !bookmark.short_id().is_empty() {
            return false;
        }
        let short_id = short_id_for(&bookmark.created_at(), bookmark.id());
        bookmark.set_short_id(short_id);
        true
    })?;
    Ok(true)
}

fn drop_search_highlight(store: &mut Store) -> Result<bool> {
    rewrite_each(store, |bookmark| {
        bookmark
            .additional_content
            .remove(SEARCH_HIGHLIGHT_KEY)
            .is_some()
    })?;
    Ok(true)
}

/// Needs short ids; stays pending while any url-less bookmark lacks one.
fn normalize_note_urls(store: &mut Store) -> Result<bool> {
    let blocked = store
        .bookmarks
        .iter()
        .any(|bookmark| bookmark.url.trim().is_empty() && bookmark.short_id().is_empty());
    if blocked {
        return Ok(false);
    }
    rewrite_each(store, |bookmark| {
        if !bookmark.url.trim().is_empty() {
            return false;
        }
        bookmark.url = bookmark.note_url();
        true
    })?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::types::BookmarkDraft;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> Store {
        let config = StoreConfig::builder().data_dir(dir.path()).build().unwrap();
        Store::load(&config, true).unwrap()
    }

    #[test]
    fn registry_order_is_stable() {
        let names: Vec<_> = builtin_migrations().iter().map(|m| m.name).collect();
        assert_eq!(
            names,
            vec![
                "strip_dash_tags",
                "backfill_short_ids",
                "drop_search_highlight",
                "normalize_note_urls"
            ]
        );
    }

    #[test]
    fn legacy_records_are_repaired_and_persisted() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let id = store
            .create(BookmarkDraft::builder().url("https://a.example").build())
            .unwrap();
        store.persist().unwrap();

        {
            let legacy = &mut store.bookmarks[0];
            legacy.set_short_id(String::new());
            legacy.url = String::new();
            legacy.tags_mut().push("--old".into());
            legacy.set_extra(SEARCH_HIGHLIGHT_KEY, "title:0-3");
        }

        assert!(!normalize_note_urls(&mut store).unwrap());
        for migration in builtin_migrations() {
            assert!((migration.run)(&mut store).unwrap(), "{}", migration.name);
        }

        let reloaded = Store::load(store.config(), true).unwrap();
        let repaired = reloaded.get_by_id(id).unwrap();
        assert!(repaired.updated_at().is_some());
        assert_eq!(repaired.short_id().len(), 6);
        assert_eq!(repaired.url, repaired.note_url());
        assert!(repaired.has_tag("old"));
        assert!(repaired.tags().iter().all(|tag| !tag.starts_with('-')));
        assert!(repaired.extra(SEARCH_HIGHLIGHT_KEY).is_none());
    }

    #[test]
    fn untouched_records_keep_their_update_time() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let id = store
            .create(BookmarkDraft::builder().url("https://a.example").tags("dev").build())
            .unwrap();
        store.persist().unwrap();

        for migration in builtin_migrations() {
            assert!((migration.run)(&mut store).unwrap(), "{}", migration.name);
        }
        assert!(store.get_by_id(id).unwrap().updated_at().is_none());
    }
}
