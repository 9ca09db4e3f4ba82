//! Response cache handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::info;

use marquee_core::CacheStats;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CacheStatsResponse {
    pub caches: Vec<CacheStats>,
}

/// GET /api/v1/cache/stats
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<CacheStatsResponse> {
    Json(CacheStatsResponse {
        caches: state.cache_stats(),
    })
}

/// DELETE /api/v1/cache
pub async fn clear_cache(State(state): State<Arc<AppState>>) -> StatusCode {
    state.clear_caches();
    info!("Response caches cleared");
    StatusCode::NO_CONTENT
}
