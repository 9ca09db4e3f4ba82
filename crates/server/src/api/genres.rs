//! Genre registry handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use marquee_core::Genre;

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct GenreList {
    pub genres: Vec<Genre>,
}

/// GET /api/v1/genres
///
/// Combined movie and series genres, deduplicated by id.
pub async fn list_genres(State(state): State<Arc<AppState>>) -> Result<Json<GenreList>, ApiError> {
    let service = state.service().ok_or_else(ApiError::not_configured)?;
    let genres = service.genres().await?;
    Ok(Json(GenreList { genres }))
}

/// POST /api/v1/genres/refresh
///
/// Drop the registry; the next lookup refetches both taxonomies.
pub async fn refresh_genres(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    let service = state.service().ok_or_else(ApiError::not_configured)?;
    service.refresh_genres().await;
    Ok(StatusCode::NO_CONTENT)
}
