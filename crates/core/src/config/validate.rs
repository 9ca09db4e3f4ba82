use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Cache can hold at least one entry
/// - Enrichment concurrency is at least 1
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.cache.max_entries == 0 {
        return Err(ConfigError::ValidationError(
            "cache.max_entries must be at least 1".to_string(),
        ));
    }

    if config.enrichment.concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "enrichment.concurrency must be at least 1".to_string(),
        ));
    }

    Ok(())
}
