//! Text folding used by free-text search.
//!
//! Search compares folded strings: NFKD-decomposed, combining marks removed,
//! lowercased. `"Élève"` and `"eleve"` fold to the same value.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Fold `input` for accent- and case-insensitive comparison.
#[must_use]
pub fn fold_for_search(input: &str) -> String {
    input
        .nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Split a free-text query into folded, non-empty tokens.
#[must_use]
pub fn search_tokens(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(fold_for_search)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Collapse runs of whitespace into single spaces and trim the ends.
#[must_use]
pub fn normalize_spaces(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
