use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Environment variables carrying the upstream secrets, and the config key each one sets.
const SECRET_VARS: [(&str, &str); 2] = [
    ("TMDB_API_KEY", "catalog.api_key"),
    ("OMDB_API_KEY", "enrichment.api_key"),
];

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    extract(Figment::new().merge(Toml::file(path)))
}

/// Load configuration from environment variables only
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    extract(Figment::new())
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn extract(base: Figment) -> Result<Config, ConfigError> {
    let mut figment = base.merge(Env::prefixed("MARQUEE_").split("__"));

    // Secrets are merged as strings so that an all-digit key stays a string.
    for (var, key) in SECRET_VARS {
        if let Ok(value) = std::env::var(var) {
            figment = figment.merge(Serialized::default(key, value));
        }
    }

    figment
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}
