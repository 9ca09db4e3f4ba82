//! TMDB (The Movie Database) API client.
//!
//! TMDB requires an API key for access.
//! Rate limits are generous (around 40 requests per second), but a 429 is
//! still retried with linear backoff.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::types::{
    year_from_date, CanonicalRecord, CastMember, ContentKind, CrewMember, DiscoverFilters, Genre,
    Page, TitleDetails,
};
use super::{CatalogErrorKind, CatalogFetchError, PrimaryCatalog};
use crate::cache::{CacheControl, CacheStats, ResponseCache};
use crate::config::{CacheConfig, CatalogSourceConfig};
use crate::metrics::UPSTREAM_REQUESTS;
use crate::retry::RetryPolicy;

/// Cast entries kept on a detail lookup.
const MAX_CAST: usize = 10;

/// Similar titles kept on a detail lookup.
const MAX_SIMILAR: usize = 10;

/// Crew jobs kept on a detail lookup.
const CREW_JOBS: [&str; 4] = ["Director", "Writer", "Screenplay", "Producer"];

/// TMDB API client.
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
    language: String,
    image_base_url: String,
    retry: RetryPolicy,
    listings: ResponseCache<Page<CanonicalRecord>>,
    details: ResponseCache<TitleDetails>,
}

impl TmdbClient {
    /// Create a new TMDB client.
    pub fn new(
        config: &CatalogSourceConfig,
        cache: &CacheConfig,
        retry: RetryPolicy,
    ) -> Result<Self, CatalogFetchError> {
        if config.api_key.trim().is_empty() {
            return Err(CatalogFetchError::new(
                "configure",
                CatalogErrorKind::NotConfigured("TMDB API key is required".to_string()),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogFetchError::new("configure", e.into()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
            image_base_url: config.image_base_url.trim_end_matches('/').to_string(),
            retry,
            listings: ResponseCache::from_config("tmdb_listings", cache),
            details: ResponseCache::from_config("tmdb_details", cache),
        })
    }

    /// Absolute URL for a poster/backdrop path at the given size ("w500", "original").
    pub fn image_url(&self, path: &str, size: &str) -> String {
        format!("{}/{}/{}", self.image_base_url, size, path.trim_start_matches('/'))
    }

    /// GET `path` with retries; the error carries `operation`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, CatalogFetchError> {
        let url = format!("{}{}", self.base_url, path);

        self.retry
            .run("tmdb", operation, || self.send(&url, params))
            .await
            .map_err(|kind| CatalogFetchError::new(operation, kind))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, CatalogErrorKind> {
        let result = self.request(url, params).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(CatalogErrorKind::NotFound(_)) => "not_found",
            Err(_) => "error",
        };
        UPSTREAM_REQUESTS.with_label_values(&["tmdb", outcome]).inc();

        result
    }

    async fn request<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, CatalogErrorKind> {
        debug!(url, ?params, "TMDB request");

        let response = self
            .client
            .get(url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(CatalogErrorKind::NotConfigured(
                "Invalid TMDB API key".to_string(),
            ));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(CatalogErrorKind::NotFound(url.to_string()));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CatalogErrorKind::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogErrorKind::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| CatalogErrorKind::ParseError(e.to_string()))
    }

    /// Fetch a listing through the listing cache.
    async fn listing(
        &self,
        operation: &'static str,
        cache_key: String,
        path: &str,
        params: &[(&str, String)],
        default_kind: Option<ContentKind>,
    ) -> Result<Page<CanonicalRecord>, CatalogFetchError> {
        if let Some(page) = self.listings.get(&cache_key) {
            debug!(cache_key = %cache_key, "TMDB listing from cache");
            return Ok(page);
        }

        let response: TmdbListResponse = self.get_json(operation, path, params).await?;
        let page = normalize_listing(response, default_kind);

        self.listings.set(cache_key, page.clone());
        Ok(page)
    }
}

impl CacheControl for TmdbClient {
    fn cache_stats(&self) -> Vec<CacheStats> {
        vec![self.listings.stats(), self.details.stats()]
    }

    /// Drop every cached listing and detail response.
    fn clear_cache(&self) {
        self.listings.clear();
        self.details.clear();
    }
}

#[async_trait]
impl PrimaryCatalog for TmdbClient {
    async fn trending(&self, page: u32) -> Result<Page<CanonicalRecord>, CatalogFetchError> {
        let page = page.max(1);
        debug!("TMDB trending: page={}", page);

        self.listing(
            "trending",
            format!("trending:all:week:page={}", page),
            "/trending/all/week",
            &[("page", page.to_string())],
            None,
        )
        .await
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
    ) -> Result<Page<CanonicalRecord>, CatalogFetchError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Page::empty());
        }
        let page = page.max(1);
        debug!("TMDB search: query='{}', page={}", query, page);

        self.listing(
            "search",
            format!("search:query={}:page={}", query, page),
            "/search/multi",
            &[("query", query.to_string()), ("page", page.to_string())],
            None,
        )
        .await
    }

    async fn discover(
        &self,
        filters: &DiscoverFilters,
    ) -> Result<Page<CanonicalRecord>, CatalogFetchError> {
        debug!(?filters, "TMDB discover");

        let mut params = vec![
            ("page", filters.page.max(1).to_string()),
            ("sort_by", filters.sort_by_or_default().to_string()),
        ];
        if !filters.genre_ids.is_empty() {
            let genres: Vec<String> = filters.genre_ids.iter().map(|g| g.to_string()).collect();
            params.push(("with_genres", genres.join(",")));
        }
        if let Some(year) = filters.year {
            let key = match filters.kind {
                ContentKind::Movie => "primary_release_year",
                ContentKind::Series => "first_air_date_year",
            };
            params.push((key, year.to_string()));
        }
        if let Some(min_rating) = filters.min_rating {
            params.push(("vote_average.gte", min_rating.to_string()));
        }

        let path = format!("/discover/{}", filters.kind.catalog_segment());
        self.listing(
            "discover",
            filters.cache_key(),
            &path,
            &params,
            Some(filters.kind),
        )
        .await
    }

    async fn details(&self, id: u64, kind: ContentKind) -> Result<TitleDetails, CatalogFetchError> {
        let cache_key = format!("details:{}:{}", kind.catalog_segment(), id);
        if let Some(details) = self.details.get(&cache_key) {
            debug!(cache_key = %cache_key, "TMDB details from cache");
            return Ok(details);
        }

        debug!("TMDB details: kind={}, id={}", kind, id);

        let path = format!("/{}/{}", kind.catalog_segment(), id);
        let response: TmdbDetailsResponse = self
            .get_json(
                "details",
                &path,
                &[(
                    "append_to_response",
                    "credits,similar,external_ids".to_string(),
                )],
            )
            .await?;

        let details = response
            .into_details(kind)
            .map_err(|e| CatalogFetchError::new("details", e))?;

        self.details.set(cache_key, details.clone());
        Ok(details)
    }

    async fn genres(&self, kind: ContentKind) -> Result<Vec<Genre>, CatalogFetchError> {
        debug!("TMDB genres: kind={}", kind);

        let path = format!("/genre/{}/list", kind.catalog_segment());
        let response: TmdbGenreList = self.get_json("genres", &path, &[]).await?;

        Ok(response
            .genres
            .into_iter()
            .map(|g| Genre {
                id: g.id,
                name: g.name,
            })
            .collect())
    }
}

// ============================================================================
// TMDB API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TmdbListResponse {
    #[serde(default = "first_page")]
    page: u32,
    /// Entries are decoded one by one so that a bad entry only drops itself.
    #[serde(default)]
    results: Vec<serde_json::Value>,
    #[serde(default)]
    total_pages: u32,
    #[serde(default)]
    total_results: u32,
}

fn first_page() -> u32 {
    1
}

/// A listing entry. Movies carry `title`/`release_date`, series carry
/// `name`/`first_air_date`; mixed listings add `media_type`.
#[derive(Debug, Deserialize)]
struct TmdbListItem {
    id: u64,
    media_type: Option<String>,
    title: Option<String>,
    name: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    #[serde(default)]
    genre_ids: Vec<u32>,
    overview: Option<String>,
    vote_average: Option<f32>,
    popularity: Option<f64>,
    vote_count: Option<u32>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    id: u32,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbGenreList {
    #[serde(default)]
    genres: Vec<TmdbGenre>,
}

#[derive(Debug, Deserialize)]
struct TmdbDetailsResponse {
    id: u64,
    title: Option<String>,
    name: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    #[serde(default)]
    genres: Vec<TmdbGenre>,
    overview: Option<String>,
    vote_average: Option<f32>,
    popularity: Option<f64>,
    vote_count: Option<u32>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    runtime: Option<u32>,
    #[serde(default)]
    episode_run_time: Vec<u32>,
    number_of_seasons: Option<u32>,
    tagline: Option<String>,
    status: Option<String>,
    imdb_id: Option<String>,
    external_ids: Option<TmdbExternalIds>,
    #[serde(default)]
    created_by: Vec<TmdbCreator>,
    credits: Option<TmdbCredits>,
    similar: Option<TmdbListResponse>,
}

#[derive(Debug, Deserialize)]
struct TmdbExternalIds {
    imdb_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbCreator {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbCredits {
    #[serde(default)]
    cast: Vec<TmdbCastCredit>,
    #[serde(default)]
    crew: Vec<TmdbCrewCredit>,
}

#[derive(Debug, Deserialize)]
struct TmdbCastCredit {
    name: String,
    character: Option<String>,
    profile_path: Option<String>,
    #[serde(default)]
    order: u32,
}

#[derive(Debug, Deserialize)]
struct TmdbCrewCredit {
    name: String,
    #[serde(default)]
    job: String,
}

// ============================================================================
// Conversions
// ============================================================================

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TmdbListItem {
    /// Normalize into a canonical record. Entries that are neither movies nor
    /// series (people) and entries without a title yield `None`.
    fn into_record(self, default_kind: Option<ContentKind>) -> Option<CanonicalRecord> {
        let kind = match self.media_type.as_deref() {
            Some(media_type) => ContentKind::parse(media_type)?,
            None => default_kind?,
        };

        let (title, date) = match kind {
            ContentKind::Movie => (self.title.or(self.name), self.release_date),
            ContentKind::Series => (self.name.or(self.title), self.first_air_date),
        };
        let title = non_empty(title)?;

        Some(CanonicalRecord {
            id: self.id,
            title,
            kind,
            year: date.as_deref().and_then(year_from_date),
            genre_ids: self.genre_ids,
            plot: self.overview.unwrap_or_default(),
            rating: self.vote_average.unwrap_or(0.0),
            popularity: self.popularity.unwrap_or(0.0),
            vote_count: self.vote_count.unwrap_or(0),
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            cast: vec![],
            director: None,
            runtime_minutes: None,
            external_id: None,
        })
    }
}

fn normalize_records(
    results: Vec<serde_json::Value>,
    default_kind: Option<ContentKind>,
) -> Vec<CanonicalRecord> {
    results
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<TmdbListItem>(value) {
            Ok(item) => item.into_record(default_kind),
            Err(e) => {
                warn!(error = %e, "Dropping malformed TMDB listing entry");
                None
            }
        })
        .collect()
}

fn normalize_listing(
    response: TmdbListResponse,
    default_kind: Option<ContentKind>,
) -> Page<CanonicalRecord> {
    Page {
        results: normalize_records(response.results, default_kind),
        page: response.page,
        total_pages: response.total_pages,
        total_results: response.total_results,
    }
}

impl TmdbDetailsResponse {
    fn into_details(self, kind: ContentKind) -> Result<TitleDetails, CatalogErrorKind> {
        let (title, date) = match kind {
            ContentKind::Movie => (self.title.or(self.name), self.release_date),
            ContentKind::Series => (self.name.or(self.title), self.first_air_date),
        };
        let title = non_empty(title).ok_or_else(|| {
            CatalogErrorKind::ParseError(format!("{} {} has no title", kind, self.id))
        })?;

        let (mut cast_credits, crew_credits) = match self.credits {
            Some(credits) => (credits.cast, credits.crew),
            None => (vec![], vec![]),
        };
        cast_credits.sort_by_key(|c| c.order);
        let cast: Vec<CastMember> = cast_credits
            .into_iter()
            .take(MAX_CAST)
            .map(|c| CastMember {
                name: c.name,
                character: non_empty(c.character),
                profile_path: c.profile_path,
            })
            .collect();

        let crew: Vec<CrewMember> = crew_credits
            .into_iter()
            .filter(|c| CREW_JOBS.contains(&c.job.as_str()))
            .map(|c| CrewMember {
                name: c.name,
                job: c.job,
            })
            .collect();

        // Series rarely credit a director; fall back to the creator.
        let director = crew
            .iter()
            .find(|c| c.job == "Director")
            .map(|c| c.name.clone())
            .or_else(|| self.created_by.first().map(|c| c.name.clone()));

        let runtime_minutes = self
            .runtime
            .filter(|r| *r > 0)
            .or_else(|| self.episode_run_time.first().copied());

        let external_id = non_empty(self.imdb_id)
            .or_else(|| self.external_ids.and_then(|ids| non_empty(ids.imdb_id)));

        let similar = self
            .similar
            .map(|s| normalize_records(s.results, Some(kind)))
            .unwrap_or_default()
            .into_iter()
            .take(MAX_SIMILAR)
            .collect();

        let genres: Vec<Genre> = self
            .genres
            .into_iter()
            .map(|g| Genre {
                id: g.id,
                name: g.name,
            })
            .collect();

        let record = CanonicalRecord {
            id: self.id,
            title,
            kind,
            year: date.as_deref().and_then(year_from_date),
            genre_ids: genres.iter().map(|g| g.id).collect(),
            plot: self.overview.unwrap_or_default(),
            rating: self.vote_average.unwrap_or(0.0),
            popularity: self.popularity.unwrap_or(0.0),
            vote_count: self.vote_count.unwrap_or(0),
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            cast: cast.iter().map(|c| c.name.clone()).collect(),
            director,
            runtime_minutes,
            external_id,
        };

        Ok(TitleDetails {
            record,
            genres,
            cast,
            crew,
            tagline: non_empty(self.tagline),
            status: non_empty(self.status),
            number_of_seasons: self.number_of_seasons,
            similar,
        })
    }
}
