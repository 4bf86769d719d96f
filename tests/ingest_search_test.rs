//! End-to-end tests: ingest a JSON corpus from disk, then query it through
//! the HTTP router.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use brew_search::api::{build_router, AppState};
use brew_search::ingest::{self, IngestStats};
use brew_search::search::SearchEngine;
use http_body_util::BodyExt;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

fn write_corpus(dir: &Path, files: &[(&str, &str)]) {
    for (name, content) in files {
        std::fs::write(dir.join(name), content).unwrap();
    }
}

/// Ingest `files` into a fresh index and hand back the wired state.
async fn ingested(
    files: &[(&str, &str)],
    batch_size: usize,
) -> (TempDir, TempDir, Arc<SearchEngine>, Arc<IngestStats>) {
    let corpus = TempDir::new().unwrap();
    let index = TempDir::new().unwrap();
    write_corpus(corpus.path(), files);

    let engine = Arc::new(SearchEngine::open_or_create(index.path()).unwrap());
    assert!(engine.was_created());

    let stats = Arc::new(IngestStats::default());
    ingest::ingest_dir(&engine, corpus.path(), batch_size, &stats)
        .await
        .unwrap();

    (corpus, index, engine, stats)
}

fn router(engine: &Arc<SearchEngine>, stats: &Arc<IngestStats>) -> Router {
    build_router(AppState::new(engine.clone(), stats.clone()))
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn term_search_returns_the_matching_identifier() {
    let (_corpus, _index, engine, stats) = ingested(
        &[
            ("a.json", r#"{"name": "ale"}"#),
            ("b.json", r#"{"name": "stout"}"#),
        ],
        100,
    )
    .await;

    let (status, body) = get(router(&engine, &stats), "/search/ale").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Results for: ale"));
    assert!(body.contains("1. a ("), "expected hit for `a` in:\n{body}");
    assert!(!body.contains("1. b ("));
}

#[tokio::test]
async fn geo_search_without_geo_documents_finds_nothing() {
    let (_corpus, _index, engine, stats) = ingested(
        &[
            ("a.json", r#"{"name": "ale"}"#),
            ("b.json", r#"{"name": "stout"}"#),
        ],
        100,
    )
    .await;

    let (status, body) = get(router(&engine, &stats), "/geosearch/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("0 matches"), "unexpected body:\n{body}");
}

#[tokio::test]
async fn conjunction_search_keeps_nearby_documents_only() {
    let (_corpus, _index, engine, stats) = ingested(
        &[
            (
                "c.json",
                r#"{"name": "ipa", "geo": {"lon": -122.1078, "lat": 37.3993}, "state": "CA"}"#,
            ),
            (
                "d.json",
                r#"{"name": "ipa", "geo": {"lon": 2.35, "lat": 48.85}, "state": "FR"}"#,
            ),
        ],
        100,
    )
    .await;

    let (status, body) = get(router(&engine, &stats), "/geosearch/ipa").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("1. c ("), "expected hit for `c` in:\n{body}");
    assert!(!body.contains("d ("), "`d` is 100mi+ from the anchor:\n{body}");
}

#[tokio::test]
async fn term_search_reports_the_state_facet() {
    let (_corpus, _index, engine, stats) = ingested(
        &[
            (
                "c.json",
                r#"{"name": "ipa", "geo": {"lon": -122.1078, "lat": 37.3993}, "state": "CA"}"#,
            ),
            (
                "d.json",
                r#"{"name": "ipa", "geo": {"lon": 2.35, "lat": 48.85}, "state": "FR"}"#,
            ),
        ],
        100,
    )
    .await;

    let (status, body) = get(router(&engine, &stats), "/search/ipa").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("2 matches"));
    assert!(body.contains("Facets:"));
    assert!(
        body.contains("CA (1)") || body.contains("FR (1)"),
        "expected a singleton facet bucket in:\n{body}"
    );
}

#[tokio::test]
async fn batches_are_submitted_in_ceil_n_over_b_chunks() {
    let files: Vec<(String, String)> = (0..5)
        .map(|i| (format!("doc{i}.json"), format!(r#"{{"name": "beer {i}"}}"#)))
        .collect();
    let borrowed: Vec<(&str, &str)> = files
        .iter()
        .map(|(n, c)| (n.as_str(), c.as_str()))
        .collect();

    let (_corpus, _index, engine, stats) = ingested(&borrowed, 2).await;

    // 5 documents at batch size 2: 2 + 2 + 1.
    assert_eq!(stats.docs_indexed(), 5);
    assert_eq!(stats.batches_committed(), 3);
    assert_eq!(engine.doc_count().unwrap(), 5);
}

#[tokio::test]
async fn ingestion_fails_fast_and_keeps_committed_batches() {
    let corpus = TempDir::new().unwrap();
    let index = TempDir::new().unwrap();
    // Entries are processed in filename order: a, b, c.
    write_corpus(
        corpus.path(),
        &[
            ("a.json", r#"{"name": "ale"}"#),
            ("b.json", r#"{"name": "#),
            ("c.json", r#"{"name": "stout"}"#),
        ],
    );

    let engine = Arc::new(SearchEngine::open_or_create(index.path()).unwrap());
    let stats = Arc::new(IngestStats::default());
    let err = ingest::ingest_dir(&engine, corpus.path(), 1, &stats)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("b.json"), "got: {err}");
    // Only the batch submitted before the malformed file survives.
    assert_eq!(engine.doc_count().unwrap(), 1);
    assert_eq!(engine.term_search("ale").unwrap().total, 1);
    assert_eq!(engine.term_search("stout").unwrap().total, 0);
    assert!(stats.snapshot().last_error.unwrap().contains("b.json"));
}

#[tokio::test]
async fn restart_opens_the_existing_index_without_ingesting() {
    let corpus = TempDir::new().unwrap();
    let index = TempDir::new().unwrap();
    write_corpus(
        corpus.path(),
        &[
            ("a.json", r#"{"name": "ale"}"#),
            ("b.json", r#"{"name": "stout"}"#),
        ],
    );

    {
        let engine = SearchEngine::open_or_create(index.path()).unwrap();
        assert!(engine.was_created());
        let stats = IngestStats::default();
        ingest::ingest_dir(&engine, corpus.path(), 100, &stats)
            .await
            .unwrap();
        // Dropped here: releases the writer lock, like a process restart.
    }

    let engine = Arc::new(SearchEngine::open_or_create(index.path()).unwrap());
    assert!(!engine.was_created(), "an existing index must not re-ingest");
    assert_eq!(engine.doc_count().unwrap(), 2);

    let stats = Arc::new(IngestStats::default());
    let (status, body) = get(router(&engine, &stats), "/search/stout").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("1. b ("));
}

#[tokio::test]
async fn landing_page_lists_the_endpoints() {
    let (_corpus, _index, engine, stats) = ingested(&[], 100).await;

    let (status, body) = get(router(&engine, &stats), "/").await;
    assert_eq!(status, StatusCode::OK);
    for endpoint in ["/search/", "/geosearch/", "/debug/vars"] {
        assert!(body.contains(endpoint), "landing page missing {endpoint}");
    }
}

#[tokio::test]
async fn debug_vars_exposes_ingest_and_index_counters() {
    let (_corpus, _index, engine, stats) = ingested(
        &[
            ("a.json", r#"{"name": "ale"}"#),
            ("b.json", r#"{"name": "stout"}"#),
        ],
        100,
    )
    .await;

    let (status, body) = get(router(&engine, &stats), "/debug/vars").await;
    assert_eq!(status, StatusCode::OK);
    let vars: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(vars["ingest"]["docs_indexed"], 2);
    assert_eq!(vars["ingest"]["batches_committed"], 1);
    assert_eq!(vars["ingest"]["running"], false);
    assert_eq!(vars["index"]["docs"], 2);
}

#[tokio::test]
async fn unparsable_queries_are_rejected_with_400() {
    let (_corpus, _index, engine, stats) =
        ingested(&[("a.json", r#"{"name": "ale"}"#)], 100).await;

    let (status, _body) = get(router(&engine, &stats), "/search/%22unbalanced").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
