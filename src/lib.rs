#![deny(clippy::all, clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![cfg_attr(
    test,
    allow(
        clippy::useless_vec,
        clippy::uninlined_format_args,
        clippy::cast_possible_truncation
    )
)]
#![allow(clippy::module_name_repetitions)]
//
// Documentation lints: internal helpers are self-describing; public APIs carry docs.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
//
// Pattern matching: these pedantic lints often suggest changes that reduce clarity.
#![allow(clippy::manual_let_else)]
#![allow(clippy::match_same_arms)]
//
// Builders and options take owned values and return `Self`.
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::default_trait_access)]
#![allow(clippy::field_reassign_with_default)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::map_unwrap_or)]
#![allow(clippy::unnecessary_wraps)]

//! Bookmark datastore core: a single-file collection of links and notes,
//! a read-only tag/text filter engine over it, and ordered data migrations.

/// The linkshelf-core crate version (matches `Cargo.toml`).
pub const LINKSHELF_CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod constants;
pub mod error;
pub mod filter;
pub mod history;
pub mod io;
mod lock;
pub mod store;
pub mod tags;
pub mod text;
pub mod types;
pub mod updater;

pub use config::{GeneralConfig, PrivacyConfig, ResourceConfig, StoreConfig, StoreConfigBuilder};
pub use error::{LinkshelfError, Result};
pub use filter::FilterEngine;
pub use history::{History, HistoryLog, MemoryHistory, NoopHistory};
pub use lock::{LockSettings, LockTimeoutPolicy};
pub use store::{ImportOptions, ImportSummary, Store};
pub use types::{
    Bookmark, BookmarkDraft, BookmarkDraftBuilder, BookmarkId, ExtraValue, HistoryEntry,
    HistoryEventKind, SearchRequest, SearchResult, TagCount, Visibility, parse_day, short_id_for,
};
pub use updater::{Migration, MigrationFn, MigrationRecord, Updater, builtin_migrations};
