//! Filter engine benchmarks over a generated collection.
//!
//! - `tag_query`: positive, negative and wildcard tag tokens
//! - `text_query`: accent-folded free-text matching
//! - `tag_counts`: case-insensitive tag grouping
//!
//! ```bash
//! cargo bench --bench filter_benchmark
//! ```

use std::hint::black_box;

use chrono::{Duration, TimeZone, Utc};
use criterion::{Criterion, criterion_group, criterion_main};
use linkshelf_core::{Bookmark, BookmarkDraft, FilterEngine, SearchRequest, Store, StoreConfig};
use tempfile::TempDir;

const TAGS: [&str; 8] = [
    "dev", "stuff", "gnu", "w3c", "devops", "Web", "rust", ".later",
];
const WORDS: [&str; 6] = ["café", "ownership", "network", "résumé", "kernel", "browser"];

fn corpus(size: usize) -> Vec<Bookmark> {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig::builder().data_dir(dir.path()).build().unwrap();
    let mut store = Store::load(&config, true).unwrap();
    let mut rng = fastrand::Rng::with_seed(7);
    let start = Utc.with_ymd_and_hms(2012, 1, 1, 0, 0, 0).unwrap();

    for i in 0..size {
        let tags: Vec<&str> = (0..rng.usize(0..4))
            .map(|_| TAGS[rng.usize(..TAGS.len())])
            .collect();
        let draft = BookmarkDraft::builder()
            .url(format!("https://example.com/{i}"))
            .title(format!("Bookmark {i} about {}", WORDS[rng.usize(..WORDS.len())]))
            .description(format!("{} #{}", WORDS[rng.usize(..WORDS.len())], TAGS[i % TAGS.len()]))
            .tags(&tags.join(" "))
            .private(rng.bool())
            .created_at(start + Duration::hours(rng.i64(0..30_000)))
            .build();
        store.create(draft).unwrap();
    }
    store.get_all().into_iter().cloned().collect()
}

fn bench_filters(c: &mut Criterion) {
    let bookmarks = corpus(5_000);
    let owner = FilterEngine::new(&bookmarks, true);
    let visitor = FilterEngine::new(&bookmarks, false);

    let tag_request = SearchRequest::default().tags("dev* -gnu stuff");
    c.bench_function("tag_query", |b| {
        b.iter(|| black_box(owner.search(black_box(&tag_request)).total_count()));
    });

    let text_request = SearchRequest::default().term("cafe bookmark");
    c.bench_function("text_query", |b| {
        b.iter(|| black_box(visitor.search(black_box(&text_request)).total_count()));
    });

    c.bench_function("tag_counts", |b| {
        b.iter(|| black_box(owner.tag_counts(None, None).len()));
    });
}

criterion_group!(benches, bench_filters);
criterion_main!(benches);
