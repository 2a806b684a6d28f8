// tests/books_merge.rs
//
// Books search fans out to a title and an author query; results are
// concatenated in that order with duplicates removed.

mod common;

use std::sync::Arc;

use clicknotes::catalog::{ApiKey, CatalogClient, FetchError, MediaId};
use clicknotes::config::SuitabilityPolicy;
use clicknotes::search::{QueryOrchestrator, SourceSet, MediaKind};
use common::{test_settings, volume, volumes, MockFetcher};

fn run_books(f: Arc<MockFetcher>) -> (QueryOrchestrator, SourceSet) {
    let orch = QueryOrchestrator::new(CatalogClient::new(f), Arc::new(SuitabilityPolicy::default()));
    (orch, SourceSet::from_settings(&test_settings()))
}

fn text_ids(items: &[clicknotes::normalize::NormalizedMediaItem]) -> Vec<String> {
    items.iter().map(|i| i.id.to_string()).collect()
}

#[tokio::test]
async fn title_and_author_results_merge_without_duplicates() {
    let f = MockFetcher::new()
        .on(
            "books.search.title",
            Ok(volumes(&[volume("a", "Carrie", Some(4.0)), volume("b", "Misery", None)])),
        )
        .on(
            "books.search.author",
            Ok(volumes(&[volume("b", "Misery", None), volume("c", "It", Some(3.5))])),
        )
        .into_arc();

    let (orch, sources) = run_books(f.clone());
    let out = orch
        .search("King", &ApiKey::new("g"), sources.for_kind(MediaKind::Books))
        .await;

    assert_eq!(text_ids(&out.items), vec!["a", "b", "c"]);
    assert!(out.error.is_none());
    assert_eq!(out.items[0].vote_average, Some(8.0), "stars rescale onto 0..=10");
    assert_eq!(out.items[0].overview, "A story.");
    assert_eq!(out.items[0].authors, vec!["A. Writer".to_string()]);

    let author_call = f
        .calls()
        .into_iter()
        .find(|e| e.label == "books.search.author")
        .expect("author search issued");
    assert_eq!(author_call.query_value("q").as_deref(), Some("inauthor:King"));
    assert_eq!(author_call.query_value("maxResults").as_deref(), Some("20"));
    assert_eq!(author_call.query_value("key").as_deref(), Some("g"));
}

#[tokio::test]
async fn low_rated_books_are_filtered() {
    let f = MockFetcher::new()
        .on("books.search.title", Ok(volumes(&[volume("x", "Meh", Some(2.5)), volume("y", "Fine", Some(3.5))])))
        .on("books.search.author", Ok(volumes(&[])))
        .into_arc();

    let (orch, sources) = run_books(f);
    let out = orch
        .search("q", &ApiKey::new("g"), sources.for_kind(MediaKind::Books))
        .await;
    assert_eq!(out.items.len(), 1);
    assert_eq!(out.items[0].id, MediaId::Text("y".into()));
}

#[tokio::test]
async fn missing_items_array_means_no_results() {
    let f = MockFetcher::new()
        .on("books.search.title", Ok(serde_json::json!({"kind": "books#volumes", "totalItems": 0})))
        .on("books.search.author", Ok(serde_json::json!({"kind": "books#volumes", "totalItems": 0})))
        .into_arc();

    let (orch, sources) = run_books(f);
    let out = orch
        .search("zzzz", &ApiKey::new("g"), sources.for_kind(MediaKind::Books))
        .await;
    assert!(out.items.is_empty());
    assert!(out.error.is_none());
    assert!(!out.empty_query);
}

#[tokio::test]
async fn one_failing_source_still_returns_the_other() {
    let f = MockFetcher::new()
        .on("books.search.title", Err(FetchError::RateLimited))
        .on("books.search.author", Ok(volumes(&[volume("c", "It", Some(4.5))])))
        .into_arc();

    let (orch, sources) = run_books(f);
    let out = orch
        .search("King", &ApiKey::new("g"), sources.for_kind(MediaKind::Books))
        .await;
    assert_eq!(text_ids(&out.items), vec!["c"]);
    assert_eq!(out.error, Some(FetchError::RateLimited));
}
