use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use marquee_core::SanitizedConfig;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

#[derive(Serialize)]
pub struct StatusResponse {
    /// Both upstream keys are present.
    pub configured: bool,
    pub catalog_configured: bool,
    pub enrichment_configured: bool,
    pub enrichment_enabled: bool,
    pub genres_loaded: bool,
}

/// GET /api/v1/status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let credentials = state.credentials();
    let (enrichment_enabled, genres_loaded) = match state.service() {
        Some(service) => (
            service.enrichment_enabled(),
            service.genre_registry().is_loaded().await,
        ),
        None => (false, false),
    };

    Json(StatusResponse {
        configured: credentials.catalog_configured && credentials.enrichment_configured,
        catalog_configured: credentials.catalog_configured,
        enrichment_configured: credentials.enrichment_configured,
        enrichment_enabled,
        genres_loaded,
    })
}
