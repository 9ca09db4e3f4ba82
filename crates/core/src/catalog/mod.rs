//! Primary catalog source (TMDB).
//!
//! Listings (trending, search, discover), detail lookups and genre lists,
//! normalized into [`CanonicalRecord`]s. Failures here are fatal to the
//! calling operation and carry the operation name.

mod tmdb;
mod types;

pub use tmdb::TmdbClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::retry::Retryable;

/// What went wrong talking to the primary source.
#[derive(Debug, Error)]
pub enum CatalogErrorKind {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Network-level failure that may clear up on its own.
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Missing or rejected API key.
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

impl Retryable for CatalogErrorKind {
    fn is_retryable(&self) -> bool {
        match self {
            Self::HttpError(e) => !e.is_builder() && !e.is_decode(),
            Self::RateLimitExceeded | Self::Unavailable(_) => true,
            Self::ApiError { status, .. } => *status >= 500,
            Self::NotFound(_) | Self::ParseError(_) | Self::NotConfigured(_) => false,
        }
    }
}

/// A failed primary catalog operation.
#[derive(Debug, Error)]
#[error("Catalog {operation} failed: {kind}")]
pub struct CatalogFetchError {
    /// Operation name ("trending", "search", "discover", "details", "genres").
    pub operation: &'static str,
    pub kind: CatalogErrorKind,
}

impl CatalogFetchError {
    pub fn new(operation: &'static str, kind: CatalogErrorKind) -> Self {
        Self { operation, kind }
    }

    /// True for authentication/configuration failures, which callers should
    /// surface as a configuration problem instead of a transient error.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self.kind, CatalogErrorKind::NotConfigured(_))
    }
}

/// Trait for primary catalog clients.
///
/// Implemented by [`TmdbClient`] and by the test double in
/// [`crate::testing::MockPrimaryCatalog`].
#[async_trait]
pub trait PrimaryCatalog: Send + Sync {
    /// Trending titles (movies and series mixed).
    async fn trending(&self, page: u32) -> Result<Page<CanonicalRecord>, CatalogFetchError>;

    /// Search movies and series. A blank query yields an empty page without
    /// contacting the source.
    async fn search(
        &self,
        query: &str,
        page: u32,
    ) -> Result<Page<CanonicalRecord>, CatalogFetchError>;

    /// Filtered listing of one kind.
    async fn discover(
        &self,
        filters: &DiscoverFilters,
    ) -> Result<Page<CanonicalRecord>, CatalogFetchError>;

    /// Full details for one title.
    async fn details(&self, id: u64, kind: ContentKind) -> Result<TitleDetails, CatalogFetchError>;

    /// Genre taxonomy for one kind.
    async fn genres(&self, kind: ContentKind) -> Result<Vec<Genre>, CatalogFetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(CatalogErrorKind::RateLimitExceeded.is_retryable());
        assert!(CatalogErrorKind::Unavailable("reset".to_string()).is_retryable());
        assert!(CatalogErrorKind::ApiError {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(!CatalogErrorKind::ApiError {
            status: 400,
            message: String::new()
        }
        .is_retryable());
        assert!(!CatalogErrorKind::NotConfigured("bad key".to_string()).is_retryable());
        assert!(!CatalogErrorKind::NotFound("movie 1".to_string()).is_retryable());
    }

    #[test]
    fn test_fetch_error_carries_operation() {
        let err = CatalogFetchError::new("trending", CatalogErrorKind::RateLimitExceeded);
        assert_eq!(err.operation, "trending");
        assert!(err.to_string().starts_with("Catalog trending failed"));
        assert!(!err.is_configuration_error());

        let err = CatalogFetchError::new(
            "search",
            CatalogErrorKind::NotConfigured("Invalid TMDB API key".to_string()),
        );
        assert!(err.is_configuration_error());
    }
}
