//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! with mock sources injected, so the HTTP surface can be exercised without
//! network access or API keys.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use marquee_core::{
    testing::{MockEnrichmentSource, MockPrimaryCatalog},
    BatchEnricher, CatalogService, Config, ContentKind,
};
use marquee_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use marquee_core::testing::fixtures;

/// Test fixture for API testing with mock sources.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_trending() {
///     let fixture = TestFixture::new().await;
///     fixture.catalog.set_titles(vec![fixtures::movie(1, "Heat", 1995)]).await;
///
///     let response = fixture.get("/api/v1/titles/trending").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock primary catalog - configure listings, details and genres
    pub catalog: Arc<MockPrimaryCatalog>,
    /// Mock enrichment source - configure per-title enrichment
    pub enrichment: Arc<MockEnrichmentSource>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Options for building a fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Wire a catalog service at all (false simulates a missing TMDB key).
    pub catalog_configured: bool,
    pub enrichment_enabled: bool,
    pub page_size: usize,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            catalog_configured: true,
            enrichment_enabled: true,
            page_size: 20,
        }
    }
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let catalog = Arc::new(MockPrimaryCatalog::with_page_size(test_config.page_size));
        let enrichment = Arc::new(MockEnrichmentSource::new());

        catalog
            .set_genres(ContentKind::Movie, fixtures::movie_genres())
            .await;
        catalog
            .set_genres(ContentKind::Series, fixtures::series_genres())
            .await;

        let mut config = Config::default();
        if test_config.catalog_configured {
            config.catalog.api_key = "test-tmdb-key".to_string();
        }
        if test_config.enrichment_enabled {
            config.enrichment.api_key = "test-omdb-key".to_string();
        }

        let service = test_config.catalog_configured.then(|| {
            let enricher = test_config
                .enrichment_enabled
                .then(|| BatchEnricher::new(enrichment.clone()));
            Arc::new(
                CatalogService::new(catalog.clone(), enricher)
                    .with_page_size(test_config.page_size as u32),
            )
        });

        let state = Arc::new(AppState::new(config, service, Vec::new()));
        let router = create_router(state);

        Self {
            router,
            catalog,
            enrichment,
        }
    }

    /// Make a GET request.
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request("GET", uri).await
    }

    /// Make a POST request without a body.
    pub async fn post(&self, uri: &str) -> TestResponse {
        self.request("POST", uri).await
    }

    /// Make a DELETE request.
    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request("DELETE", uri).await
    }

    /// Make a GET request and return the raw body text.
    pub async fn get_text(&self, uri: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn request(&self, method: &str, uri: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
