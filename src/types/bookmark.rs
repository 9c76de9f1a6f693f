//! The bookmark record and its write-time normalization.

use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{NOTE_URL_PREFIX, SEARCH_HIGHLIGHT_KEY, SHORT_ID_DATE_FORMAT};
use crate::tags::{canonical_tags, normalize_tags, parse_tags, tag_key, tags_equal};
use crate::text::normalize_spaces;
use crate::{LinkshelfError, Result};

/// Stable numeric bookmark identifier.
pub type BookmarkId = u64;

/// Value stored in a bookmark's extension bag. The core never interprets these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for ExtraValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ExtraValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ExtraValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ExtraValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ExtraValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A saved link or note.
///
/// `id`, `short_id` and `created_at` are fixed once the store assigns them;
/// tags are kept normalized (see [`crate::tags`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    id: BookmarkId,
    short_id: String,
    pub url: String,
    pub title: String,
    pub description: String,
    tags: Vec<String>,
    pub private: bool,
    pub sticky: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    pub additional_content: BTreeMap<String, ExtraValue>,
}

impl Bookmark {
    /// Materialize a draft under an allocated id.
    pub(crate) fn from_draft(draft: BookmarkDraft, id: BookmarkId, now: DateTime<Utc>) -> Self {
        let created_at = draft.created_at.unwrap_or(now);
        let mut bookmark = Self {
            id,
            short_id: draft
                .short_id
                .unwrap_or_else(|| short_id_for(&created_at, id)),
            url: draft.url,
            title: draft.title,
            description: draft.description,
            tags: normalize_tags(draft.tags),
            private: draft.private,
            sticky: draft.sticky,
            created_at,
            updated_at: None,
            additional_content: draft.additional_content,
        };
        bookmark.normalize();
        bookmark
    }

    #[must_use]
    pub fn id(&self) -> BookmarkId {
        self.id
    }

    #[must_use]
    pub fn short_id(&self) -> &str {
        &self.short_id
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Calendar day (UTC) the bookmark was created on.
    #[must_use]
    pub fn created_day(&self) -> NaiveDate {
        self.created_at.date_naive()
    }

    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Canonical space-separated tag string.
    #[must_use]
    pub fn tags_string(&self) -> String {
        canonical_tags(&self.tags)
    }

    /// Replace the tag set; tokens are normalized and de-duplicated.
    pub fn set_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = normalize_tags(tags);
    }

    /// Replace the tag set from a user-supplied string (spaces or commas).
    pub fn set_tags_str(&mut self, tags: &str) {
        self.tags = parse_tags(tags);
    }

    pub fn add_tag(&mut self, tag: &str) {
        let mut tags = std::mem::take(&mut self.tags);
        tags.push(tag.to_string());
        self.tags = normalize_tags(tags);
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|own| tags_equal(own, tag))
    }

    /// Substitute `from` with `to`, merging into `to` when it is already
    /// present. Returns whether the tag set changed.
    pub fn rename_tag(&mut self, from: &str, to: &str) -> bool {
        if !self.has_tag(from) {
            return false;
        }
        let from_key = tag_key(from);
        let renamed: Vec<String> = self
            .tags
            .iter()
            .map(|tag| {
                if tag_key(tag) == from_key {
                    to.trim().to_string()
                } else {
                    tag.clone()
                }
            })
            .collect();
        let renamed = normalize_tags(renamed);
        let changed = renamed != self.tags;
        self.tags = renamed;
        changed
    }

    /// Remove every occurrence of `tag`. Returns whether the tag set changed.
    pub fn delete_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        let key = tag_key(tag);
        self.tags.retain(|own| tag_key(own) != key);
        before != self.tags.len()
    }

    /// Notes carry a self-referencing url instead of an external link.
    #[must_use]
    pub fn is_note(&self) -> bool {
        self.url.is_empty() || self.url.starts_with(NOTE_URL_PREFIX)
    }

    /// Permalink marker used as the url of notes.
    #[must_use]
    pub fn note_url(&self) -> String {
        format!("{NOTE_URL_PREFIX}{}", self.short_id)
    }

    pub fn set_extra<K: Into<String>, V: Into<ExtraValue>>(&mut self, key: K, value: V) {
        self.additional_content.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn extra(&self, key: &str) -> Option<&ExtraValue> {
        self.additional_content.get(key)
    }

    /// Check invariants and fill derived defaults before the record is stored.
    pub(crate) fn validate(&mut self) -> Result<()> {
        if self.short_id.is_empty() {
            return Err(LinkshelfError::invalid_bookmark(format!(
                "bookmark {} has no short id",
                self.id
            )));
        }
        if let Some(updated_at) = self.updated_at {
            if updated_at < self.created_at {
                return Err(LinkshelfError::invalid_bookmark(format!(
                    "bookmark {} updated before it was created",
                    self.id
                )));
            }
        }
        self.normalize();
        Ok(())
    }

    fn normalize(&mut self) {
        self.url = self.url.trim().to_string();
        if self.url.is_empty() && !self.short_id.is_empty() {
            self.url = self.note_url();
        }
        self.title = normalize_spaces(&self.title);
        if self.title.is_empty() {
            self.title = self.url.clone();
        }
        self.additional_content.remove(SEARCH_HIGHLIGHT_KEY);
    }

    /// Stamp a mutation time, never earlier than creation.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now.max(self.created_at));
    }

    /// Carry over the fields that are fixed at creation.
    pub(crate) fn inherit_identity(&mut self, stored: &Bookmark) {
        self.id = stored.id;
        self.short_id = stored.short_id.clone();
        self.created_at = stored.created_at;
    }

    pub(crate) fn set_short_id(&mut self, short_id: String) {
        self.short_id = short_id;
    }

    #[cfg(test)]
    pub(crate) fn tags_mut(&mut self) -> &mut Vec<String> {
        &mut self.tags
    }
}

/// Derive the 6-character permalink slug for a record.
#[must_use]
pub fn short_id_for(created_at: &DateTime<Utc>, id: BookmarkId) -> String {
    let seed = format!("{}{id}", created_at.format(SHORT_ID_DATE_FORMAT));
    let digest = blake3::hash(seed.as_bytes());
    URL_SAFE_NO_PAD.encode(&digest.as_bytes()[..4])
}

/// Caller-supplied fields for a new bookmark.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookmarkDraft {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub sticky: bool,
    /// Only set for imports; defaults to the creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Only set for imports that preserve existing permalinks.
    #[serde(default)]
    pub short_id: Option<String>,
    #[serde(default)]
    pub additional_content: BTreeMap<String, ExtraValue>,
}

impl BookmarkDraft {
    #[must_use]
    pub fn builder() -> BookmarkDraftBuilder {
        BookmarkDraftBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct BookmarkDraftBuilder {
    inner: BookmarkDraft,
}

impl BookmarkDraftBuilder {
    pub fn url<S: Into<String>>(mut self, url: S) -> Self {
        self.inner.url = url.into();
        self
    }

    pub fn title<S: Into<String>>(mut self, title: S) -> Self {
        self.inner.title = title.into();
        self
    }

    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.inner.description = description.into();
        self
    }

    /// Tags as a user string, separated by spaces or commas.
    #[must_use]
    pub fn tags(mut self, tags: &str) -> Self {
        self.inner.tags = parse_tags(tags);
        self
    }

    pub fn push_tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.inner.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn private(mut self, private: bool) -> Self {
        self.inner.private = private;
        self
    }

    #[must_use]
    pub fn sticky(mut self, sticky: bool) -> Self {
        self.inner.sticky = sticky;
        self
    }

    #[must_use]
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.inner.created_at = Some(created_at);
        self
    }

    pub fn short_id<S: Into<String>>(mut self, short_id: S) -> Self {
        self.inner.short_id = Some(short_id.into());
        self
    }

    pub fn extra<K: Into<String>, V: Into<ExtraValue>>(mut self, key: K, value: V) -> Self {
        self.inner.additional_content.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn build(self) -> BookmarkDraft {
        self.inner
    }
}
