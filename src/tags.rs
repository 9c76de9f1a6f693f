//! Tag token rules.
//!
//! Tags are case-preserving tokens without whitespace. Membership tests and
//! grouping compare lowercase keys; the canonical stored form is the tokens
//! joined by single spaces.

use std::collections::HashSet;

use crate::constants::HIDDEN_TAG_PREFIX;

/// Lowercase comparison key for a tag.
#[must_use]
pub fn tag_key(tag: &str) -> String {
    tag.to_lowercase()
}

/// Case-insensitive tag equality.
#[must_use]
pub fn tags_equal(a: &str, b: &str) -> bool {
    a == b || tag_key(a) == tag_key(b)
}

/// True when the tag is hidden from anonymous visitors (`.private-ish`).
#[must_use]
pub fn is_hidden(tag: &str) -> bool {
    tag.starts_with(HIDDEN_TAG_PREFIX)
}

/// Parse a user-supplied tag string. Tokens are separated by whitespace or
/// commas; a leading `-` is stripped so stored tags never look like negative
/// search terms.
#[must_use]
pub fn parse_tags(input: &str) -> Vec<String> {
    normalize_tags(input.split(|c: char| c.is_whitespace() || c == ','))
}

/// Normalize an arbitrary token list: trim, strip leading dashes, drop
/// empties and case-insensitive duplicates (first casing wins).
pub fn normalize_tags<I, S>(tokens: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for token in tokens {
        for piece in token.as_ref().split_whitespace() {
            let piece = piece.trim_start_matches('-');
            if piece.is_empty() {
                continue;
            }
            if seen.insert(tag_key(piece)) {
                out.push(piece.to_string());
            }
        }
    }
    out
}

/// Canonical single-string form of a tag set.
#[must_use]
pub fn canonical_tags(tags: &[String]) -> String {
    tags.join(" ")
}
