//! Secondary enrichment source (OMDb).
//!
//! Looks up one title at a time by external ID or by (title, year, kind).
//! A missing title is not an error, and neither is a failed lookup: the
//! [`EnrichmentSource`] trait only ever answers "here is the data" or "no
//! data", so one bad lookup cannot abort a wider enrichment pass.

mod omdb;
mod types;

pub use omdb::OmdbClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::catalog::ContentKind;
use crate::retry::Retryable;

/// Errors raised inside the enrichment client before they are absorbed.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate or quota limit reached.
    #[error("Request limit reached")]
    RateLimitExceeded,

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

impl Retryable for EnrichmentError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::HttpError(e) => !e.is_builder() && !e.is_decode(),
            Self::RateLimitExceeded => true,
            Self::ApiError { status, .. } => *status >= 500,
            Self::ParseError(_) | Self::NotConfigured(_) => false,
        }
    }
}

/// Trait for enrichment sources.
///
/// Implementations must absorb their own failures and answer `None`.
#[async_trait]
pub trait EnrichmentSource: Send + Sync {
    /// Look up a title by IMDb ID.
    async fn lookup_by_id(&self, external_id: &str) -> Option<EnrichmentRecord>;

    /// Look up a title by name, optional year and kind.
    async fn lookup_by_title(
        &self,
        title: &str,
        year: Option<i32>,
        kind: ContentKind,
    ) -> Option<EnrichmentRecord>;
}
