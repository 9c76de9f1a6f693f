#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use linkshelf_core::{BookmarkDraft, BookmarkId, Store, StoreConfig};

pub fn config(dir: &TempDir) -> StoreConfig {
    StoreConfig::builder().data_dir(dir.path()).build().unwrap()
}

pub fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 10, 30, 0).unwrap()
}

pub fn draft(url: &str, tags: &str, created: DateTime<Utc>) -> BookmarkDraft {
    BookmarkDraft::builder()
        .url(url)
        .title(format!("Title of {url}"))
        .tags(tags)
        .created_at(created)
        .build()
}

/// Authenticated store pre-filled with `drafts`, already persisted.
pub fn seeded_store(dir: &TempDir, drafts: Vec<BookmarkDraft>) -> (Store, Vec<BookmarkId>) {
    let mut store = Store::load(&config(dir), true).unwrap();
    let ids = drafts
        .into_iter()
        .map(|draft| store.create(draft).unwrap())
        .collect();
    store.persist().unwrap();
    (store, ids)
}
