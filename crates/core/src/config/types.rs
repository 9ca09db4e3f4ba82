use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub catalog: CatalogSourceConfig,
    #[serde(default)]
    pub enrichment: EnrichmentSourceConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Which of the two upstream secrets are present.
    pub fn credentials(&self) -> CredentialStatus {
        CredentialStatus {
            catalog_configured: !self.catalog.api_key.trim().is_empty(),
            enrichment_configured: !self.enrichment.api_key.trim().is_empty(),
        }
    }

    /// True when both the catalog and the enrichment keys are set.
    pub fn is_configured(&self) -> bool {
        let status = self.credentials();
        status.catalog_configured && status.enrichment_configured
    }
}

/// Presence of the upstream API keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CredentialStatus {
    pub catalog_configured: bool,
    pub enrichment_configured: bool,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Primary catalog source (TMDB) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogSourceConfig {
    /// API key. Usually supplied through `TMDB_API_KEY`.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_catalog_base_url")]
    pub base_url: String,
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,
    /// Response language sent with every request (e.g. "en-US").
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for CatalogSourceConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_catalog_base_url(),
            image_base_url: default_image_base_url(),
            language: default_language(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_catalog_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_image_base_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Secondary enrichment source (OMDb) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnrichmentSourceConfig {
    /// API key. Usually supplied through `OMDB_API_KEY`.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_enrichment_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Lookups issued concurrently within one batch.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Plot length requested from the source ("short" or "full").
    #[serde(default = "default_plot")]
    pub plot: String,
}

impl Default for EnrichmentSourceConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_enrichment_base_url(),
            timeout_secs: default_timeout(),
            concurrency: default_concurrency(),
            plot: default_plot(),
        }
    }
}

fn default_enrichment_base_url() -> String {
    "https://www.omdbapi.com".to_string()
}

fn default_concurrency() -> usize {
    5
}

fn default_plot() -> String {
    "full".to_string()
}

/// Response cache configuration, shared by both upstream clients
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_max_entries() -> usize {
    100
}

fn default_ttl_secs() -> u64 {
    300
}

/// Upstream retry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry; the n-th retry waits n times this.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub catalog: SanitizedCatalogConfig,
    pub enrichment: SanitizedEnrichmentConfig,
    pub cache: CacheConfig,
    pub retry: RetryConfig,
}

/// Sanitized catalog config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCatalogConfig {
    pub base_url: String,
    pub api_key_configured: bool,
    pub language: String,
    pub timeout_secs: u64,
}

/// Sanitized enrichment config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedEnrichmentConfig {
    pub base_url: String,
    pub api_key_configured: bool,
    pub concurrency: usize,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let credentials = config.credentials();
        Self {
            server: config.server.clone(),
            catalog: SanitizedCatalogConfig {
                base_url: config.catalog.base_url.clone(),
                api_key_configured: credentials.catalog_configured,
                language: config.catalog.language.clone(),
                timeout_secs: config.catalog.timeout_secs,
            },
            enrichment: SanitizedEnrichmentConfig {
                base_url: config.enrichment.base_url.clone(),
                api_key_configured: credentials.enrichment_configured,
                concurrency: config.enrichment.concurrency,
                timeout_secs: config.enrichment.timeout_secs,
            },
            cache: config.cache.clone(),
            retry: config.retry.clone(),
        }
    }
}
