//! Read-only query engine over a bookmark slice.
//!
//! Filters combine with logical AND: visibility, tag query, free text and
//! creation day. Results come back newest first (descending `created_at`);
//! bookmarks created at the same instant keep their stored order. An
//! anonymous caller only ever sees public bookmarks, whatever the request
//! says.

mod pattern;

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::tags::{is_hidden, tag_key};
use crate::text::{fold_for_search, search_tokens};
use crate::types::{Bookmark, SearchRequest, SearchResult, TagCount, Visibility};

use pattern::TagQuery;

pub struct FilterEngine<'a> {
    bookmarks: &'a [Bookmark],
    authenticated: bool,
    default_visibility: Visibility,
}

impl<'a> FilterEngine<'a> {
    #[must_use]
    pub fn new(bookmarks: &'a [Bookmark], authenticated: bool) -> Self {
        Self {
            bookmarks,
            authenticated,
            default_visibility: Visibility::All,
        }
    }

    /// Visibility used when a request does not name one.
    #[must_use]
    pub fn with_default_visibility(mut self, visibility: Visibility) -> Self {
        self.default_visibility = visibility;
        self
    }

    /// Effective visibility for a request, or `None` when nothing may be
    /// shown (an anonymous caller asking for private bookmarks).
    fn resolve_visibility(&self, requested: Option<Visibility>) -> Option<Visibility> {
        let requested = requested.unwrap_or(self.default_visibility);
        if self.authenticated {
            return Some(requested);
        }
        match requested {
            Visibility::Private => None,
            Visibility::All | Visibility::Public => Some(Visibility::Public),
        }
    }

    /// Every bookmark in default order, without any filtering.
    fn ordered(&self) -> Vec<&'a Bookmark> {
        let mut ordered: Vec<&'a Bookmark> = self.bookmarks.iter().collect();
        ordered.sort_by_key(|bookmark| Reverse(bookmark.created_at()));
        ordered
    }

    #[must_use]
    pub fn search(&self, request: &SearchRequest) -> SearchResult<'a> {
        self.search_with_query(request).0
    }

    fn search_with_query(&self, request: &SearchRequest) -> (SearchResult<'a>, TagQuery) {
        let Some(visibility) = self.resolve_visibility(request.visibility) else {
            return (SearchResult::new(Vec::new()), TagQuery::default());
        };
        let query = match request.tags.as_deref() {
            Some(tags) => match TagQuery::parse(tags, visibility == Visibility::Public) {
                Some(query) => query,
                None => return (SearchResult::new(Vec::new()), TagQuery::default()),
            },
            None => TagQuery::default(),
        };
        let terms = request
            .term
            .as_deref()
            .map(search_tokens)
            .unwrap_or_default();

        let matches: Vec<&'a Bookmark> = self
            .ordered()
            .into_iter()
            .filter(|bookmark| visibility.admits(bookmark.private))
            .filter(|bookmark| {
                request
                    .day
                    .is_none_or(|day| bookmark.created_day() == day)
            })
            .filter(|bookmark| !request.untagged_only || bookmark.tags().is_empty())
            .filter(|bookmark| query.matches(bookmark))
            .filter(|bookmark| terms.is_empty() || matches_terms(bookmark, &terms))
            .collect();
        tracing::debug!(
            search.visibility = %visibility,
            search.matches = matches.len(),
            "bookmark search"
        );
        (SearchResult::new(matches), query)
    }

    /// Bookmarks created on `day`, newest first.
    #[must_use]
    pub fn filter_day(&self, day: NaiveDate) -> SearchResult<'a> {
        self.search(&SearchRequest::default().day(day))
    }

    /// Tag frequencies over the bookmarks matching `subset` at `visibility`.
    ///
    /// Grouping ignores case; each group is displayed with the first casing
    /// met in default order. Tags matched by the subset's positive tokens
    /// (wildcards included) are left out, as are hidden tags for anonymous
    /// callers. Sorted by count descending, ties in
    /// first-seen order.
    #[must_use]
    pub fn tag_counts(&self, subset: Option<&str>, visibility: Option<Visibility>) -> Vec<TagCount> {
        let mut request = SearchRequest {
            visibility,
            ..SearchRequest::default()
        };
        if let Some(subset) = subset {
            request.tags = Some(subset.to_string());
        }
        let (result, query) = self.search_with_query(&request);

        let mut counts: Vec<TagCount> = Vec::new();
        let mut slots: HashMap<String, usize> = HashMap::new();
        for bookmark in result.bookmarks() {
            for tag in bookmark.tags() {
                if !self.authenticated && is_hidden(tag) {
                    continue;
                }
                if query.includes(tag) {
                    continue;
                }
                let key = tag_key(tag);
                match slots.get(&key) {
                    Some(&slot) => counts[slot].count += 1,
                    None => {
                        slots.insert(key, counts.len());
                        counts.push(TagCount {
                            tag: tag.clone(),
                            count: 1,
                        });
                    }
                }
            }
        }
        counts.sort_by_key(|entry| Reverse(entry.count));
        counts
    }

    /// Look a bookmark up by its permalink slug.
    #[must_use]
    pub fn find_by_short_id(&self, short_id: &str) -> Option<&'a Bookmark> {
        self.bookmarks
            .iter()
            .find(|bookmark| bookmark.short_id() == short_id)
            .filter(|bookmark| self.authenticated || !bookmark.private)
    }

    /// Distinct creation days of visible bookmarks, ascending.
    #[must_use]
    pub fn days(&self) -> Vec<NaiveDate> {
        let Some(visibility) = self.resolve_visibility(None) else {
            return Vec::new();
        };
        self.bookmarks
            .iter()
            .filter(|bookmark| visibility.admits(bookmark.private))
            .map(Bookmark::created_day)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn matches_terms(bookmark: &Bookmark, terms: &[String]) -> bool {
    let haystack = fold_for_search(&format!(
        "{}\n{}\n{}\n{}",
        bookmark.title,
        bookmark.description,
        bookmark.url,
        bookmark.tags_string()
    ));
    terms.iter().all(|term| haystack.contains(term.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BookmarkDraft;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn fixture() -> Vec<Bookmark> {
        let specs = [
            (0, "Élément de style", "dev stuff", false, at(2012, 12, 6)),
            (1, "Plain dev page", "dev", true, at(2015, 3, 10)),
            (2, "GNU project", "gnu stuff .todo", false, at(2014, 11, 25)),
        ];
        specs
            .into_iter()
            .map(|(id, title, tags, private, created)| {
                let draft = BookmarkDraft::builder()
                    .url(format!("https://example.com/{id}"))
                    .title(title)
                    .tags(tags)
                    .private(private)
                    .created_at(created)
                    .build();
                Bookmark::from_draft(draft, id, created)
            })
            .collect()
    }

    #[test]
    fn default_order_is_newest_first() {
        let bookmarks = fixture();
        let engine = FilterEngine::new(&bookmarks, true);
        assert_eq!(engine.search(&SearchRequest::default()).ids(), vec![1, 2, 0]);
    }

    #[test]
    fn negative_tag_excludes() {
        let bookmarks = fixture();
        let engine = FilterEngine::new(&bookmarks, true);
        let result = engine.search(&SearchRequest::default().tags("stuff -gnu"));
        assert_eq!(result.ids(), vec![0]);
    }

    #[test]
    fn free_text_ignores_accents_and_case() {
        let bookmarks = fixture();
        let engine = FilterEngine::new(&bookmarks, true);
        let result = engine.search(&SearchRequest::default().term("element STYLE"));
        assert_eq!(result.ids(), vec![0]);
        assert!(engine
            .search(&SearchRequest::default().term("element gnu"))
            .is_empty());
    }

    #[test]
    fn anonymous_private_request_is_empty() {
        let bookmarks = fixture();
        let engine = FilterEngine::new(&bookmarks, false);
        assert!(engine
            .search(&SearchRequest::default().visibility(Visibility::Private))
            .is_empty());
        assert_eq!(engine.search(&SearchRequest::default()).ids(), vec![2, 0]);
    }

    #[test]
    fn tag_counts_skip_subset_and_hidden_tags_for_anonymous() {
        let bookmarks = fixture();
        let anonymous = FilterEngine::new(&bookmarks, false);
        let counts = anonymous.tag_counts(Some("stuff"), None);
        let names: Vec<_> = counts.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(names, vec!["gnu", "dev"]);

        let owner = FilterEngine::new(&bookmarks, true);
        let counts = owner.tag_counts(None, None);
        assert_eq!(counts[0], TagCount { tag: "dev".into(), count: 2 });
        assert!(counts.iter().any(|c| c.tag == ".todo"));
    }

    #[test]
    fn wildcard_subset_leaves_out_every_matched_tag() {
        let bookmarks = fixture();
        let owner = FilterEngine::new(&bookmarks, true);
        let counts = owner.tag_counts(Some("st*"), None);
        let names: Vec<_> = counts.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(names, vec!["gnu", ".todo", "dev"]);
    }

    #[test]
    fn days_are_distinct_and_ascending() {
        let bookmarks = fixture();
        let engine = FilterEngine::new(&bookmarks, true);
        let days = engine.days();
        assert_eq!(days.first(), NaiveDate::from_ymd_opt(2012, 12, 6).as_ref());
        assert_eq!(days.len(), 3);
        assert_eq!(engine.filter_day(days[1]).ids(), vec![2]);
    }

    #[test]
    fn short_id_lookup_hides_private_from_anonymous() {
        let bookmarks = fixture();
        let private_slug = bookmarks[1].short_id().to_string();
        assert!(FilterEngine::new(&bookmarks, true)
            .find_by_short_id(&private_slug)
            .is_some());
        assert!(FilterEngine::new(&bookmarks, false)
            .find_by_short_id(&private_slug)
            .is_none());
    }
}
