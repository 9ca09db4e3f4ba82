//! Enrichment pipeline integration tests.
//!
//! These tests run the real HTTP clients against canned-response servers and
//! check the whole path: listing -> per-title lookup -> merge -> genre names.

use std::sync::Arc;

use serde_json::json;

use marquee_core::{
    config::{CacheConfig, CatalogSourceConfig, EnrichmentSourceConfig},
    testing::{fixtures, MockEnrichmentSource, MockPrimaryCatalog, StubServer},
    BatchEnricher, CatalogService, ContentKind, OmdbClient, RetryPolicy, StaleGuard, TmdbClient,
};

fn tmdb_client(base_url: &str) -> TmdbClient {
    let config = CatalogSourceConfig {
        api_key: "tmdb-test-key".to_string(),
        base_url: base_url.to_string(),
        ..Default::default()
    };
    TmdbClient::new(&config, &CacheConfig::default(), RetryPolicy::none())
        .expect("Failed to create TMDB client")
}

fn omdb_client(base_url: &str) -> OmdbClient {
    let config = EnrichmentSourceConfig {
        api_key: "omdb-test-key".to_string(),
        base_url: base_url.to_string(),
        ..Default::default()
    };
    OmdbClient::new(&config, &CacheConfig::default(), RetryPolicy::none())
        .expect("Failed to create OMDb client")
}

fn trending_body() -> String {
    json!({
        "page": 1,
        "total_pages": 3,
        "total_results": 45,
        "results": [
            {
                "id": 603,
                "media_type": "movie",
                "title": "The Matrix",
                "release_date": "1999-03-31",
                "overview": "short",
                "genre_ids": [28, 878],
                "vote_average": 8.2,
                "popularity": 80.5,
                "vote_count": 24000
            },
            {
                "id": 17419,
                "media_type": "person",
                "name": "Somebody Famous"
            },
            {
                "id": 1396,
                "media_type": "tv",
                "name": "Breaking Bad",
                "first_air_date": "2008-01-20",
                "overview": "A chemistry teacher diagnosed with cancer turns to manufacturing drugs.",
                "genre_ids": [18, 4242],
                "vote_average": 8.9
            }
        ]
    })
    .to_string()
}

fn genres_body(genres: serde_json::Value) -> String {
    json!({ "genres": genres }).to_string()
}

#[tokio::test]
async fn test_trending_page_end_to_end() {
    let tmdb = StubServer::start(vec![
        (200, trending_body()),
        (
            200,
            genres_body(json!([
                { "id": 28, "name": "Action" },
                { "id": 18, "name": "Drama" },
                { "id": 878, "name": "Science Fiction" }
            ])),
        ),
        (
            200,
            genres_body(json!([
                { "id": 18, "name": "Drama (TV)" },
                { "id": 10759, "name": "Action & Adventure" }
            ])),
        ),
    ])
    .await;
    let omdb = StubServer::start(vec![
        (
            200,
            json!({
                "Title": "The Matrix",
                "Year": "1999",
                "Runtime": "136 min",
                "Director": "Lana Wachowski, Lilly Wachowski",
                "Actors": "Keanu Reeves, Laurence Fishburne",
                "Plot": "a considerably longer plot description",
                "imdbRating": "8.7",
                "imdbID": "tt0133093",
                "Type": "movie",
                "Response": "True"
            })
            .to_string(),
        ),
        (
            200,
            json!({ "Response": "False", "Error": "Series not found!" }).to_string(),
        ),
    ])
    .await;

    let catalog = Arc::new(tmdb_client(&tmdb.base_url()));
    let enrichment = Arc::new(omdb_client(&omdb.base_url()));
    // One lookup at a time keeps the stub's response order deterministic.
    let service = CatalogService::new(
        catalog,
        Some(BatchEnricher::with_concurrency(enrichment, 1)),
    );

    let page = service.trending(1).await.expect("trending failed");

    assert_eq!(page.results.len(), 2);

    let matrix = &page.results[0];
    assert_eq!(matrix.record.id, 603);
    assert!(matrix.record.enriched);
    assert_eq!(matrix.record.rating, 8.7);
    assert_eq!(matrix.record.plot, "a considerably longer plot description");
    assert_eq!(matrix.record.cast, vec!["Keanu Reeves", "Laurence Fishburne"]);
    assert_eq!(matrix.record.runtime_minutes, Some(136));
    assert_eq!(matrix.genre_names, vec!["Action", "Science Fiction"]);

    let breaking_bad = &page.results[1];
    assert_eq!(breaking_bad.record.kind, ContentKind::Series);
    assert!(!breaking_bad.record.enriched);
    assert_eq!(breaking_bad.record.rating, 8.9);
    assert_eq!(breaking_bad.genre_names, vec!["Drama", "Unknown"]);

    assert_eq!(page.pagination.total_pages, 3);
    assert!(page.pagination.has_next_page);
    assert_eq!(page.page_window, vec![1, 2, 3]);
    assert_eq!(page.items_range.end, 20);

    let omdb_requests = omdb.requests();
    assert!(omdb_requests[0].contains("t=The%20Matrix") || omdb_requests[0].contains("t=The+Matrix"));
    assert!(omdb_requests[1].contains("type=series"));
}

#[tokio::test]
async fn test_enrichment_outage_still_returns_page() {
    let tmdb = StubServer::start(vec![
        (200, trending_body()),
        (200, genres_body(json!([]))),
        (200, genres_body(json!([]))),
    ])
    .await;
    // Every OMDb request gets a 500.
    let omdb = StubServer::start(vec![]).await;

    let service = CatalogService::new(
        Arc::new(tmdb_client(&tmdb.base_url())),
        Some(BatchEnricher::new(Arc::new(omdb_client(&omdb.base_url())))),
    );

    let page = service.trending(1).await.expect("trending failed");

    assert_eq!(page.results.len(), 2);
    assert!(page.results.iter().all(|t| !t.record.enriched));
    assert_eq!(page.results[0].record.plot, "short");
    assert_eq!(omdb.request_count(), 2);
}

#[tokio::test]
async fn test_repeated_page_is_served_from_cache() {
    let tmdb = StubServer::start(vec![
        (200, trending_body()),
        (200, genres_body(json!([]))),
        (200, genres_body(json!([]))),
    ])
    .await;
    let service = CatalogService::new(Arc::new(tmdb_client(&tmdb.base_url())), None);

    service.trending(1).await.expect("first call failed");
    service.trending(1).await.expect("second call failed");

    assert_eq!(tmdb.request_count(), 3);
}

#[tokio::test]
async fn test_stale_results_are_discarded_by_caller() {
    let catalog = Arc::new(MockPrimaryCatalog::new());
    catalog
        .set_titles(vec![
            fixtures::movie(1, "Alien", 1979),
            fixtures::movie(2, "Aliens", 1986),
        ])
        .await;
    let source = Arc::new(MockEnrichmentSource::new());
    let service = CatalogService::new(catalog, Some(BatchEnricher::new(source)));

    let older = service.search("alien", 1).await.unwrap();
    let newer = service.search("aliens", 1).await.unwrap();

    let mut guard = StaleGuard::new();
    assert!(guard.accept(newer.request_token.unwrap()));
    assert!(!guard.accept(older.request_token.unwrap()));

    let enricher = service.enricher().unwrap();
    assert!(enricher.is_current(newer.request_token.unwrap()));
}
