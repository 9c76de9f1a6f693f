//! Search request/response types exposed by the filter engine.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::bookmark::Bookmark;
use crate::LinkshelfError;
use crate::constants::DAY_FORMAT;

/// Which bookmarks a query may return, by privacy flag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    All,
    Public,
    Private,
}

impl Visibility {
    /// Whether a bookmark with the given privacy flag passes this filter.
    #[must_use]
    pub fn admits(self, private: bool) -> bool {
        match self {
            Self::All => true,
            Self::Public => !private,
            Self::Private => private,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::Public => "public",
            Self::Private => "private",
        })
    }
}

impl FromStr for Visibility {
    type Err = LinkshelfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(Self::All),
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            other => Err(LinkshelfError::Config {
                reason: format!("unknown visibility {other:?}").into(),
            }),
        }
    }
}

/// Parse a `YYYYMMDD` day string.
pub fn parse_day(input: &str) -> crate::Result<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.len() != 8 {
        return Err(LinkshelfError::InvalidDate {
            input: input.to_string(),
        });
    }
    NaiveDate::parse_from_str(trimmed, DAY_FORMAT).map_err(|_| LinkshelfError::InvalidDate {
        input: input.to_string(),
    })
}

/// Combined filter accepted by [`crate::FilterEngine::search`]. Every set
/// field narrows the result (logical AND).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchRequest {
    /// Whitespace-separated tag tokens; `-tag` excludes.
    #[serde(default)]
    pub tags: Option<String>,
    /// Free-text tokens, all required.
    #[serde(default)]
    pub term: Option<String>,
    /// Requested visibility; anonymous callers are always limited to public.
    #[serde(default)]
    pub visibility: Option<Visibility>,
    /// Restrict to bookmarks created on this day.
    #[serde(default)]
    pub day: Option<NaiveDate>,
    /// Only bookmarks without any tag.
    #[serde(default)]
    pub untagged_only: bool,
}

impl SearchRequest {
    pub fn tags<S: Into<String>>(mut self, tags: S) -> Self {
        self.tags = Some(tags.into());
        self
    }

    pub fn term<S: Into<String>>(mut self, term: S) -> Self {
        self.term = Some(term.into());
        self
    }

    #[must_use]
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    #[must_use]
    pub fn day(mut self, day: NaiveDate) -> Self {
        self.day = Some(day);
        self
    }

    #[must_use]
    pub fn untagged_only(mut self) -> Self {
        self.untagged_only = true;
        self
    }
}

/// Ordered matches of a search, newest first.
#[derive(Debug, Clone)]
pub struct SearchResult<'a> {
    bookmarks: Vec<&'a Bookmark>,
    total_count: usize,
    offset: usize,
    limit: Option<usize>,
}

impl<'a> SearchResult<'a> {
    pub(crate) fn new(bookmarks: Vec<&'a Bookmark>) -> Self {
        let total_count = bookmarks.len();
        Self {
            bookmarks,
            total_count,
            offset: 0,
            limit: None,
        }
    }

    /// Slice the result to one page. `limit` of `None` keeps everything after
    /// `offset`.
    #[must_use]
    pub fn page(mut self, offset: usize, limit: Option<usize>) -> Self {
        let start = offset.min(self.bookmarks.len());
        let end = limit.map_or(self.bookmarks.len(), |limit| {
            start.saturating_add(limit).min(self.bookmarks.len())
        });
        self.bookmarks = self.bookmarks[start..end].to_vec();
        self.offset = offset;
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn bookmarks(&self) -> &[&'a Bookmark] {
        &self.bookmarks
    }

    #[must_use]
    pub fn into_bookmarks(self) -> Vec<&'a Bookmark> {
        self.bookmarks
    }

    /// Matches on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bookmarks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }

    /// Matches before paging.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// 1-based page number.
    #[must_use]
    pub fn page_number(&self) -> usize {
        match self.limit {
            Some(limit) if limit > 0 => self.offset / limit + 1,
            _ => 1,
        }
    }

    #[must_use]
    pub fn last_page(&self) -> usize {
        match self.limit {
            Some(limit) if limit > 0 => self.total_count.div_ceil(limit).max(1),
            _ => 1,
        }
    }

    #[must_use]
    pub fn is_first_page(&self) -> bool {
        self.offset == 0
    }

    #[must_use]
    pub fn is_last_page(&self) -> bool {
        self.page_number() >= self.last_page()
    }

    /// Ids in result order.
    #[must_use]
    pub fn ids(&self) -> Vec<u64> {
        self.bookmarks.iter().map(|bookmark| bookmark.id()).collect()
    }
}

/// One tag and the number of bookmarks carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}
