//! HTTP API integration tests against mock sources.

mod common;

use axum::http::StatusCode;
use marquee_core::{CatalogErrorKind, ContentKind};

use common::{fixtures, TestConfig, TestFixture};

async fn fixture_with_titles() -> TestFixture {
    let fixture = TestFixture::with_config(TestConfig {
        page_size: 2,
        ..Default::default()
    })
    .await;
    fixture
        .catalog
        .set_titles(vec![
            fixtures::movie(603, "The Matrix", 1999),
            fixtures::movie(604, "The Matrix Reloaded", 2003),
            fixtures::series(1396, "Breaking Bad", 2008),
        ])
        .await;
    fixture
        .enrichment
        .add_by_title("The Matrix", fixtures::enrichment_record("tt0133093"))
        .await;
    fixture
}

// =============================================================================
// Health, config, status
// =============================================================================

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_hides_keys() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/config").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["catalog"]["api_key_configured"], true);
    assert!(response.body["catalog"].get("api_key").is_none());
    assert!(!response.body.to_string().contains("test-tmdb-key"));
}

#[tokio::test]
async fn test_status_reports_credentials() {
    let fixture = TestFixture::with_config(TestConfig {
        enrichment_enabled: false,
        ..Default::default()
    })
    .await;
    let response = fixture.get("/api/v1/status").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["configured"], false);
    assert_eq!(response.body["catalog_configured"], true);
    assert_eq!(response.body["enrichment_configured"], false);
    assert_eq!(response.body["enrichment_enabled"], false);
}

// =============================================================================
// Titles
// =============================================================================

#[tokio::test]
async fn test_trending_page() {
    let fixture = fixture_with_titles().await;
    let response = fixture.get("/api/v1/titles/trending").await;

    assert_eq!(response.status, StatusCode::OK);
    let body = &response.body;
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert_eq!(body["results"][0]["title"], "The Matrix");
    assert_eq!(body["results"][0]["enriched"], true);
    assert_eq!(body["results"][0]["director"], "Some Director");
    assert_eq!(body["results"][1]["enriched"], false);
    assert_eq!(body["results"][0]["genre_names"][0], "Drama");
    assert_eq!(body["pagination"]["total_pages"], 2);
    assert_eq!(body["page_window"], serde_json::json!([1, 2]));
    assert_eq!(body["links"]["next"], "/api/v1/titles/trending?page=2");
    assert!(body["links"].get("prev").is_none());
    assert!(body["request_token"].is_u64());
}

#[tokio::test]
async fn test_second_page_links_back_without_page_param() {
    let fixture = fixture_with_titles().await;
    let response = fixture.get("/api/v1/titles/search?query=the%20matrix&page=2").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["results"].as_array().unwrap().len(), 0);
    assert_eq!(
        response.body["links"]["prev"],
        "/api/v1/titles/search?query=the%20matrix"
    );
}

#[tokio::test]
async fn test_blank_search_returns_empty_page() {
    let fixture = fixture_with_titles().await;
    let response = fixture.get("/api/v1/titles/search?query=%20%20").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["results"].as_array().unwrap().len(), 0);
    assert_eq!(fixture.catalog.query_count().await, 0);
}

#[tokio::test]
async fn test_discover_filters_by_kind() {
    let fixture = fixture_with_titles().await;
    let response = fixture
        .get("/api/v1/titles/discover?kind=tv&genres=18&sort_by=vote_average.desc")
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let results = response.body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["kind"], "series");
}

#[tokio::test]
async fn test_discover_rejects_unknown_kind() {
    let fixture = fixture_with_titles().await;
    let response = fixture.get("/api/v1/titles/discover?kind=person").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].as_str().unwrap().contains("person"));
}

#[tokio::test]
async fn test_title_details() {
    let fixture = fixture_with_titles().await;
    let response = fixture.get("/api/v1/titles/movie/603").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["id"], 603);
    assert_eq!(response.body["enriched"], true);
    assert_eq!(response.body["writer"], "Some Writer");
}

#[tokio::test]
async fn test_title_not_found() {
    let fixture = fixture_with_titles().await;
    let response = fixture.get("/api/v1/titles/series/603").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_enrichment_failure_is_invisible() {
    let fixture = fixture_with_titles().await;
    fixture.enrichment.fail_title("The Matrix").await;

    let response = fixture.get("/api/v1/titles/trending").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["results"][0]["enriched"], false);
    assert_eq!(response.body["results"][0]["title"], "The Matrix");
}

#[tokio::test]
async fn test_upstream_errors_map_to_status() {
    let fixture = fixture_with_titles().await;

    fixture
        .catalog
        .set_next_error(CatalogErrorKind::RateLimitExceeded)
        .await;
    let response = fixture.get("/api/v1/titles/trending").await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("trending"));

    fixture
        .catalog
        .set_next_error(CatalogErrorKind::NotConfigured("Invalid TMDB API key".to_string()))
        .await;
    let response = fixture.get("/api/v1/titles/trending").await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);

    fixture
        .catalog
        .set_next_error(CatalogErrorKind::ParseError("eof".to_string()))
        .await;
    let response = fixture.get("/api/v1/titles/trending").await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_missing_catalog_key_answers_503() {
    let fixture = TestFixture::with_config(TestConfig {
        catalog_configured: false,
        ..Default::default()
    })
    .await;

    assert_eq!(
        fixture.get("/api/v1/titles/trending").await.status,
        StatusCode::SERVICE_UNAVAILABLE
    );
    assert_eq!(
        fixture.get("/api/v1/genres").await.status,
        StatusCode::SERVICE_UNAVAILABLE
    );
    assert_eq!(fixture.get("/api/v1/health").await.status, StatusCode::OK);
}

// =============================================================================
// Genres and caches
// =============================================================================

#[tokio::test]
async fn test_genres_and_refresh() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/genres").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["genres"].as_array().unwrap().len(), 5);

    fixture
        .catalog
        .set_genres(ContentKind::Movie, vec![fixtures::genre(18, "Melodrama")])
        .await;
    let response = fixture.post("/api/v1/genres/refresh").await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = fixture.get("/api/v1/genres").await;
    assert_eq!(response.body["genres"][0]["name"], "Melodrama");
}

#[tokio::test]
async fn test_cache_endpoints() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/cache/stats").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["caches"].is_array());

    let response = fixture.delete("/api/v1/cache").await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/health").await;

    let (status, body) = fixture.get_text("/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("marquee_http_requests_total"));
}
