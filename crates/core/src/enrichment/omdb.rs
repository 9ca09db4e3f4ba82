//! OMDb (Open Movie Database) API client.
//!
//! OMDb answers HTTP 200 with `"Response": "False"` when nothing matches, and
//! uses the literal string "N/A" for every missing field.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

use super::types::{EnrichmentRecord, RatingValue};
use super::{EnrichmentError, EnrichmentSource};
use crate::cache::{CacheControl, CacheStats, ResponseCache};
use crate::catalog::ContentKind;
use crate::config::{CacheConfig, EnrichmentSourceConfig};
use crate::metrics::UPSTREAM_REQUESTS;
use crate::retry::RetryPolicy;

static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());
static FIRST_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").unwrap());

/// OMDb API client.
pub struct OmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
    plot: String,
    retry: RetryPolicy,
    /// Definitive answers only: a match or a "no match". Failures are not cached.
    cache: ResponseCache<Option<EnrichmentRecord>>,
}

impl OmdbClient {
    /// Create a new OMDb client.
    pub fn new(
        config: &EnrichmentSourceConfig,
        cache: &CacheConfig,
        retry: RetryPolicy,
    ) -> Result<Self, EnrichmentError> {
        if config.api_key.trim().is_empty() {
            return Err(EnrichmentError::NotConfigured(
                "OMDb API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            plot: config.plot.clone(),
            retry,
            cache: ResponseCache::from_config("omdb", cache),
        })
    }

    /// Look up by IMDb ID, surfacing transport errors.
    pub async fn fetch_by_id(
        &self,
        external_id: &str,
    ) -> Result<Option<EnrichmentRecord>, EnrichmentError> {
        let external_id = external_id.trim();
        debug!("OMDb lookup by id: {}", external_id);

        self.fetch(
            format!("id:{}", external_id),
            vec![("i", external_id.to_string())],
        )
        .await
    }

    /// Look up by title, surfacing transport errors.
    pub async fn fetch_by_title(
        &self,
        title: &str,
        year: Option<i32>,
        kind: ContentKind,
    ) -> Result<Option<EnrichmentRecord>, EnrichmentError> {
        let title = title.trim();
        debug!("OMDb lookup by title: '{}', year={:?}, kind={}", title, year, kind);

        let mut params = vec![
            ("t", title.to_string()),
            ("type", kind.enrichment_type().to_string()),
        ];
        if let Some(y) = year {
            params.push(("y", y.to_string()));
        }

        let cache_key = format!(
            "title:{}:{}:{}",
            title.to_lowercase(),
            year.map(|y| y.to_string()).unwrap_or_default(),
            kind.enrichment_type()
        );
        self.fetch(cache_key, params).await
    }

    async fn fetch(
        &self,
        cache_key: String,
        params: Vec<(&str, String)>,
    ) -> Result<Option<EnrichmentRecord>, EnrichmentError> {
        if let Some(cached) = self.cache.get(&cache_key) {
            debug!(cache_key = %cache_key, "OMDb lookup from cache");
            return Ok(cached);
        }

        let payload = self
            .retry
            .run("omdb", "lookup", || self.send(&params))
            .await?;

        let record = payload.into_record();
        self.cache.set(cache_key, record.clone());
        Ok(record)
    }

    async fn send(&self, params: &[(&str, String)]) -> Result<OmdbPayload, EnrichmentError> {
        let result = self.request(params).await;

        let outcome = match &result {
            Ok(payload) if payload.is_match() => "success",
            Ok(_) => "not_found",
            Err(_) => "error",
        };
        UPSTREAM_REQUESTS.with_label_values(&["omdb", outcome]).inc();

        result
    }

    async fn request(&self, params: &[(&str, String)]) -> Result<OmdbPayload, EnrichmentError> {
        let url = format!("{}/", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("plot", self.plot.as_str()),
            ])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(EnrichmentError::RateLimitExceeded);
        }
        if status == StatusCode::UNAUTHORIZED {
            // OMDb reports both bad keys and exhausted quotas as 401.
            let body = response.text().await.unwrap_or_default();
            if body.to_lowercase().contains("limit") {
                return Err(EnrichmentError::RateLimitExceeded);
            }
            return Err(EnrichmentError::NotConfigured(
                "Invalid OMDb API key".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| EnrichmentError::ParseError(e.to_string()))
    }
}

impl CacheControl for OmdbClient {
    fn cache_stats(&self) -> Vec<CacheStats> {
        vec![self.cache.stats()]
    }

    fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[async_trait]
impl EnrichmentSource for OmdbClient {
    async fn lookup_by_id(&self, external_id: &str) -> Option<EnrichmentRecord> {
        match self.fetch_by_id(external_id).await {
            Ok(record) => record,
            Err(e) => {
                warn!(external_id, error = %e, "OMDb lookup failed, continuing without enrichment");
                None
            }
        }
    }

    async fn lookup_by_title(
        &self,
        title: &str,
        year: Option<i32>,
        kind: ContentKind,
    ) -> Option<EnrichmentRecord> {
        match self.fetch_by_title(title, year, kind).await {
            Ok(record) => record,
            Err(e) => {
                warn!(title, ?year, error = %e, "OMDb lookup failed, continuing without enrichment");
                None
            }
        }
    }
}

// ============================================================================
// OMDb API Response Types (private)
// ============================================================================

/// A string field. "N/A", blanks and values of an unexpected JSON type all
/// read as absent.
#[derive(Debug, Default)]
struct Field(Option<String>);

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Field(match value {
            Value::String(s) => {
                let s = s.trim();
                (!s.is_empty() && s != "N/A").then(|| s.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            Value::Null => None,
            other => {
                debug!(value = %other, "Ignoring OMDb field with unexpected type");
                None
            }
        }))
    }
}

impl Field {
    fn into_inner(self) -> Option<String> {
        self.0
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OmdbPayload {
    #[serde(rename = "Response")]
    response: Field,
    #[serde(rename = "Title")]
    title: Field,
    #[serde(rename = "Year")]
    year: Field,
    #[serde(rename = "Rated")]
    rated: Field,
    #[serde(rename = "Runtime")]
    runtime: Field,
    #[serde(rename = "Director")]
    director: Field,
    #[serde(rename = "Writer")]
    writer: Field,
    #[serde(rename = "Actors")]
    actors: Field,
    #[serde(rename = "Plot")]
    plot: Field,
    #[serde(rename = "Language")]
    language: Field,
    #[serde(rename = "Country")]
    country: Field,
    #[serde(rename = "Awards")]
    awards: Field,
    #[serde(rename = "Ratings")]
    ratings: Value,
    #[serde(rename = "Metascore")]
    metascore: Field,
    #[serde(rename = "imdbRating")]
    imdb_rating: Field,
    #[serde(rename = "imdbID")]
    imdb_id: Field,
    #[serde(rename = "Type")]
    kind: Field,
    #[serde(rename = "totalSeasons")]
    total_seasons: Field,
    #[serde(rename = "BoxOffice")]
    box_office: Field,
}

fn first_number<T: std::str::FromStr>(value: &str) -> Option<T> {
    FIRST_NUMBER
        .find(value)
        .and_then(|m| m.as_str().parse().ok())
}

impl OmdbPayload {
    fn is_match(&self) -> bool {
        self.response
            .0
            .as_deref()
            .is_some_and(|r| r.eq_ignore_ascii_case("true"))
    }

    /// Normalize into an enrichment record. `None` for a no-match answer or
    /// a match without an IMDb ID.
    fn into_record(self) -> Option<EnrichmentRecord> {
        if !self.is_match() {
            return None;
        }
        let Some(external_id) = self.imdb_id.into_inner() else {
            warn!("OMDb match without imdbID, ignoring");
            return None;
        };

        let mut ratings_by_source = parse_ratings(&self.ratings);
        let rating = self
            .imdb_rating
            .into_inner()
            .and_then(|r| r.parse::<f32>().ok());
        if let Some(r) = rating {
            ratings_by_source.insert("imdbRating".to_string(), RatingValue::Number(r as f64));
        }
        if let Some(m) = self
            .metascore
            .into_inner()
            .and_then(|m| m.parse::<f64>().ok())
        {
            ratings_by_source.insert("Metascore".to_string(), RatingValue::Number(m));
        }

        let cast_names = self
            .actors
            .into_inner()
            .map(|actors| {
                actors
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Some(EnrichmentRecord {
            external_id,
            title: self.title.into_inner(),
            year: self.year.into_inner().and_then(|y| {
                FIRST_YEAR
                    .find(&y)
                    .and_then(|m| m.as_str().parse().ok())
            }),
            kind: self.kind.into_inner().and_then(|k| ContentKind::parse(&k)),
            rating,
            ratings_by_source,
            plot: self.plot.into_inner(),
            cast_names,
            director: self.director.into_inner(),
            writer: self.writer.into_inner(),
            box_office: self.box_office.into_inner(),
            runtime_minutes: self.runtime.into_inner().and_then(|r| first_number(&r)),
            total_seasons: self
                .total_seasons
                .into_inner()
                .and_then(|s| first_number(&s)),
            awards: self.awards.into_inner(),
            rated: self.rated.into_inner(),
            language: self.language.into_inner(),
            country: self.country.into_inner(),
        })
    }
}

/// `Ratings` is a list of `{ "Source": ..., "Value": ... }`; anything else is ignored.
fn parse_ratings(value: &Value) -> BTreeMap<String, RatingValue> {
    let mut ratings = BTreeMap::new();
    let Some(entries) = value.as_array() else {
        if !value.is_null() {
            debug!("Ignoring OMDb Ratings with unexpected shape");
        }
        return ratings;
    };

    for entry in entries {
        let source = entry.get("Source").and_then(Value::as_str);
        let rating = entry.get("Value").and_then(Value::as_str);
        match (source, rating) {
            (Some(source), Some(rating)) if rating != "N/A" => {
                ratings.insert(source.to_string(), RatingValue::Text(rating.to_string()));
            }
            _ => debug!(entry = %entry, "Ignoring malformed OMDb rating entry"),
        }
    }
    ratings
}
