//! JSON error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::warn;

use marquee_core::{CatalogErrorKind, CatalogFetchError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// An error answered to the client as `{ "error": ... }`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_configured() -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: "Catalog source not configured (set TMDB_API_KEY)".to_string(),
        }
    }
}

impl From<CatalogFetchError> for ApiError {
    fn from(err: CatalogFetchError) -> Self {
        let status = match &err.kind {
            CatalogErrorKind::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            CatalogErrorKind::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogErrorKind::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::BAD_GATEWAY,
        };
        if status != StatusCode::NOT_FOUND {
            warn!(operation = err.operation, error = %err, "Catalog request failed");
        }

        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}
