use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{cache, genres, handlers, middleware::metrics_middleware, titles};
use crate::metrics::metrics_handler;
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health, config and credential probe
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/status", get(handlers::get_status))
        // Titles
        .route("/titles/trending", get(titles::trending))
        .route("/titles/search", get(titles::search))
        .route("/titles/discover", get(titles::discover))
        .route("/titles/{kind}/{id}", get(titles::get_title))
        // Genres
        .route("/genres", get(genres::list_genres))
        .route("/genres/refresh", post(genres::refresh_genres))
        // Response caches
        .route("/cache/stats", get(cache::get_stats))
        .route("/cache", delete(cache::clear_cache))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
