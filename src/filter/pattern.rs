//! Tag query parsing and matching.

use once_cell::sync::OnceCell;
use regex::{Regex, RegexBuilder};

use crate::tags::{is_hidden, tag_key};
use crate::types::Bookmark;

/// One tag token of a query: exact (case-insensitive) or `*` wildcard.
#[derive(Debug, Clone)]
pub(crate) enum TagMatcher {
    Exact(String),
    Wildcard(Regex),
}

impl TagMatcher {
    fn parse(token: &str) -> Self {
        if !token.contains('*') {
            return Self::Exact(tag_key(token));
        }
        let body = token
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"\S*?");
        match RegexBuilder::new(&format!("^(?:{body})$"))
            .case_insensitive(true)
            .build()
        {
            Ok(regex) => Self::Wildcard(regex),
            Err(err) => {
                tracing::warn!(tag = token, "wildcard tag pattern rejected, matching literally: {err}");
                Self::Exact(tag_key(token))
            }
        }
    }

    fn matches(&self, tag: &str) -> bool {
        match self {
            Self::Exact(key) => tag_key(tag) == *key,
            Self::Wildcard(regex) => regex.is_match(tag),
        }
    }
}

/// Parsed tag filter: every `include` must match some tag, no `exclude` may.
#[derive(Debug, Clone, Default)]
pub(crate) struct TagQuery {
    pub(crate) include: Vec<TagMatcher>,
    pub(crate) exclude: Vec<TagMatcher>,
}

impl TagQuery {
    /// Parse a whitespace-separated tag query. Returns `None` when every token
    /// was dropped because hidden tags are not searchable at public
    /// visibility, which must yield an empty result.
    pub(crate) fn parse(input: &str, public_only: bool) -> Option<Self> {
        let tokens: Vec<&str> = input
            .split_whitespace()
            .filter(|token| !matches!(*token, "-" | "*"))
            .collect();
        if tokens.is_empty() {
            return Some(Self::default());
        }
        let tokens: Vec<&str> = if public_only {
            tokens.into_iter().filter(|token| !is_hidden(token)).collect()
        } else {
            tokens
        };
        if tokens.is_empty() {
            return None;
        }

        let mut query = Self::default();
        for token in tokens {
            match token.strip_prefix('-') {
                Some(negated) => query.exclude.push(TagMatcher::parse(negated)),
                None => query.include.push(TagMatcher::parse(token)),
            }
        }
        Some(query)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Whether `tag` is one the positive tokens ask for.
    pub(crate) fn includes(&self, tag: &str) -> bool {
        self.include.iter().any(|matcher| matcher.matches(tag))
    }

    pub(crate) fn matches(&self, bookmark: &Bookmark) -> bool {
        if self.is_empty() {
            return true;
        }
        let hashtags = description_hashtags(&bookmark.description);
        let candidates = || {
            bookmark
                .tags()
                .iter()
                .map(String::as_str)
                .chain(hashtags.iter().map(String::as_str))
        };
        self.include
            .iter()
            .all(|matcher| candidates().any(|tag| matcher.matches(tag)))
            && !self
                .exclude
                .iter()
                .any(|matcher| candidates().any(|tag| matcher.matches(tag)))
    }
}

/// `#word` tokens in a description, without the `#`.
pub(crate) fn description_hashtags(description: &str) -> Vec<String> {
    if !description.contains('#') {
        return Vec::new();
    }
    static HASHTAG: OnceCell<std::result::Result<Regex, String>> = OnceCell::new();
    let regex = HASHTAG.get_or_init(|| {
        Regex::new(r"(?:^|[^\p{Pc}\p{N}\p{L}\p{Mn}])#([\p{Pc}\p{N}\p{L}\p{Mn}]+)")
            .map_err(|err| err.to_string())
    });
    let regex = match regex {
        Ok(re) => re,
        Err(msg) => {
            tracing::error!(target = "linkshelf::filter", error = %msg, "hashtag regex init failed");
            return Vec::new();
        }
    };
    regex
        .captures_iter(description)
        .filter_map(|caps| caps.get(1))
        .map(|tag| tag.as_str().to_string())
        .collect()
}
