use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use marquee_core::{
    BatchEnricher, CacheControl, CacheStats, CatalogService, Config, CredentialStatus,
    OmdbClient, RetryPolicy, SanitizedConfig, TmdbClient,
};

/// Shared application state
pub struct AppState {
    config: Config,
    /// Absent when the catalog API key is missing.
    service: Option<Arc<CatalogService>>,
    caches: Vec<Arc<dyn CacheControl>>,
}

impl AppState {
    pub fn new(
        config: Config,
        service: Option<Arc<CatalogService>>,
        caches: Vec<Arc<dyn CacheControl>>,
    ) -> Self {
        Self {
            config,
            service,
            caches,
        }
    }

    /// Build the upstream clients and the catalog service from config.
    ///
    /// A missing catalog key leaves the service unset; a missing enrichment
    /// key only disables enrichment.
    pub fn from_config(config: Config) -> Result<Self> {
        let credentials = config.credentials();
        let retry = RetryPolicy::from(&config.retry);
        let mut caches: Vec<Arc<dyn CacheControl>> = Vec::new();

        if !credentials.catalog_configured {
            warn!("TMDB_API_KEY is not set, catalog endpoints will answer 503");
            return Ok(Self::new(config, None, caches));
        }

        let catalog = Arc::new(
            TmdbClient::new(&config.catalog, &config.cache, retry)
                .context("Failed to create TMDB client")?,
        );
        caches.push(catalog.clone());
        info!("TMDB client initialized ({})", config.catalog.base_url);

        let enricher = if credentials.enrichment_configured {
            let omdb = Arc::new(
                OmdbClient::new(&config.enrichment, &config.cache, retry)
                    .context("Failed to create OMDb client")?,
            );
            caches.push(omdb.clone());
            info!(
                concurrency = config.enrichment.concurrency,
                "OMDb enrichment enabled"
            );
            Some(BatchEnricher::with_concurrency(
                omdb,
                config.enrichment.concurrency,
            ))
        } else {
            warn!("OMDB_API_KEY is not set, titles will carry TMDB data only");
            None
        };

        let service = Arc::new(CatalogService::new(catalog, enricher));
        Ok(Self::new(config, Some(service), caches))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn credentials(&self) -> CredentialStatus {
        self.config.credentials()
    }

    pub fn service(&self) -> Option<&Arc<CatalogService>> {
        self.service.as_ref()
    }

    pub fn cache_stats(&self) -> Vec<CacheStats> {
        self.caches.iter().flat_map(|c| c.cache_stats()).collect()
    }

    pub fn clear_caches(&self) {
        for cache in &self.caches {
            cache.clear_cache();
        }
    }
}
