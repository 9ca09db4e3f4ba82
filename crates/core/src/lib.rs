pub mod cache;
pub mod catalog;
pub mod config;
pub mod enricher;
pub mod enrichment;
pub mod genres;
pub mod merge;
pub mod metrics;
pub mod pagination;
pub mod retry;
pub mod service;
pub mod testing;

pub use cache::{CacheControl, CacheStats, ResponseCache};
pub use catalog::{
    CanonicalRecord, CatalogErrorKind, CatalogFetchError, ContentKind, DiscoverFilters, Genre,
    Page, PrimaryCatalog, TitleDetails, TmdbClient,
};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, CredentialStatus, SanitizedConfig,
};
pub use enricher::{BatchEnricher, EnrichedBatch, RequestToken, StaleGuard};
pub use enrichment::{EnrichmentError, EnrichmentRecord, EnrichmentSource, OmdbClient};
pub use genres::{GenreMap, GenreRegistry};
pub use merge::{merge, MergedRecord};
pub use pagination::{items_range, page_url, page_window, pagination_info, PaginationState};
pub use retry::RetryPolicy;
pub use service::{CatalogService, EnrichedDetails, EnrichedPage, EnrichedTitle};
