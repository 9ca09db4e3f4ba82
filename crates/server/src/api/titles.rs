//! Title listing and detail handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use marquee_core::{
    page_url, CatalogService, ContentKind, DiscoverFilters, EnrichedDetails, EnrichedPage,
};

use super::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_page")]
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct DiscoverParams {
    pub kind: String,
    /// Comma-separated genre ids.
    #[serde(default)]
    pub genres: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub min_rating: Option<f32>,
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_page() -> u32 {
    1
}

/// Shareable links to the neighbouring pages.
#[derive(Debug, Serialize)]
pub struct PageLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PageResponse {
    #[serde(flatten)]
    pub page: EnrichedPage,
    pub links: PageLinks,
}

impl PageResponse {
    fn new(page: EnrichedPage, path: &str, params: &[(&str, &str)]) -> Self {
        let current = page.pagination.page;
        let links = PageLinks {
            next: page
                .pagination
                .has_next_page
                .then(|| page_url(path, params, current + 1)),
            prev: page
                .pagination
                .has_prev_page
                .then(|| page_url(path, params, current - 1)),
        };
        Self { page, links }
    }
}

fn service(state: &AppState) -> Result<&Arc<CatalogService>, ApiError> {
    state.service().ok_or_else(ApiError::not_configured)
}

fn parse_kind(kind: &str) -> Result<ContentKind, ApiError> {
    ContentKind::parse(kind).ok_or_else(|| {
        ApiError::bad_request(format!("Unknown kind '{}', expected movie or series", kind))
    })
}

fn parse_genres(genres: Option<&str>) -> Result<Vec<u32>, ApiError> {
    let Some(genres) = genres else {
        return Ok(Vec::new());
    };
    genres
        .split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(|g| {
            g.parse()
                .map_err(|_| ApiError::bad_request(format!("Invalid genre id '{}'", g)))
        })
        .collect()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/titles/trending
pub async fn trending(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse>, ApiError> {
    let page = service(&state)?.trending(params.page).await?;
    Ok(Json(PageResponse::new(page, "/api/v1/titles/trending", &[])))
}

/// GET /api/v1/titles/search
///
/// A blank query answers an empty page.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<PageResponse>, ApiError> {
    debug!(query = %params.query, page = params.page, "Title search");
    let page = service(&state)?
        .search(&params.query, params.page)
        .await?;
    Ok(Json(PageResponse::new(
        page,
        "/api/v1/titles/search",
        &[("query", params.query.trim())],
    )))
}

/// GET /api/v1/titles/discover
pub async fn discover(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DiscoverParams>,
) -> Result<Json<PageResponse>, ApiError> {
    let mut filters = DiscoverFilters::new(parse_kind(&params.kind)?);
    filters.genre_ids = parse_genres(params.genres.as_deref())?;
    filters.year = params.year;
    filters.sort_by = params.sort_by.clone().filter(|s| !s.trim().is_empty());
    filters.min_rating = params.min_rating;
    filters.page = params.page.max(1);

    let page = service(&state)?.discover(&filters).await?;

    let kind = filters.kind.to_string();
    let genres = params.genres.clone().unwrap_or_default();
    let year = params.year.map(|y| y.to_string()).unwrap_or_default();
    let min_rating = params.min_rating.map(|r| r.to_string()).unwrap_or_default();
    let sort_by = filters.sort_by.clone().unwrap_or_default();
    Ok(Json(PageResponse::new(
        page,
        "/api/v1/titles/discover",
        &[
            ("kind", kind.as_str()),
            ("genres", genres.as_str()),
            ("year", year.as_str()),
            ("sort_by", sort_by.as_str()),
            ("min_rating", min_rating.as_str()),
        ],
    )))
}

/// GET /api/v1/titles/{kind}/{id}
pub async fn get_title(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, u64)>,
) -> Result<Json<EnrichedDetails>, ApiError> {
    let kind = parse_kind(&kind)?;
    let details = service(&state)?.title(id, kind).await?;
    Ok(Json(details))
}
