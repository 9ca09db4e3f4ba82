//! Combined id→name genre mapping over the movie and series taxonomies.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::catalog::{CatalogErrorKind, CatalogFetchError, ContentKind, Genre, PrimaryCatalog};

/// Name used for ids the registry does not know.
pub const UNKNOWN_GENRE: &str = "Unknown";

/// Deduplicated genres, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreMap {
    genres: Vec<Genre>,
    by_id: HashMap<u32, String>,
}

impl GenreMap {
    /// Concatenate the lists and keep the first name seen for each id.
    pub fn merge<I>(lists: I) -> Self
    where
        I: IntoIterator<Item = Vec<Genre>>,
    {
        let mut seen = HashSet::new();
        let genres: Vec<Genre> = lists
            .into_iter()
            .flatten()
            .filter(|g| seen.insert(g.id))
            .collect();
        let by_id = genres.iter().map(|g| (g.id, g.name.clone())).collect();

        Self { genres, by_id }
    }

    pub fn genres(&self) -> &[Genre] {
        &self.genres
    }

    pub fn name(&self, id: u32) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    /// Names for `ids`, in order, with [`UNKNOWN_GENRE`] for unknown ids.
    pub fn names_for(&self, ids: &[u32]) -> Vec<String> {
        ids.iter()
            .map(|id| self.name(*id).unwrap_or(UNKNOWN_GENRE).to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.genres.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genres.is_empty()
    }
}

/// How long a failed build is remembered before the source is asked again.
pub const FAILURE_COOLDOWN: Duration = Duration::from_secs(30);

enum RegistryState {
    Empty,
    Loaded(Arc<GenreMap>),
    /// Last build failed; callers get an error without a fetch until `until`.
    Failed { until: Instant, reason: String },
}

/// Lazily built, process-lifetime genre registry.
///
/// The first [`get_all`](Self::get_all) fetches both taxonomies; later calls
/// reuse the result until [`invalidate`](Self::invalidate). Concurrent first
/// calls share one fetch. A failed fetch is remembered for
/// [`FAILURE_COOLDOWN`], so callers queued behind it fail fast instead of
/// repeating the whole retry budget one after another.
pub struct GenreRegistry {
    catalog: Arc<dyn PrimaryCatalog>,
    state: Mutex<RegistryState>,
}

impl GenreRegistry {
    pub fn new(catalog: Arc<dyn PrimaryCatalog>) -> Self {
        Self {
            catalog,
            state: Mutex::new(RegistryState::Empty),
        }
    }

    pub async fn get_all(&self) -> Result<Arc<GenreMap>, CatalogFetchError> {
        let mut state = self.state.lock().await;
        match &*state {
            RegistryState::Loaded(map) => return Ok(Arc::clone(map)),
            RegistryState::Failed { until, reason } if Instant::now() < *until => {
                return Err(CatalogFetchError::new(
                    "genres",
                    CatalogErrorKind::Unavailable(format!(
                        "genre registry cooling down after failure: {}",
                        reason
                    )),
                ));
            }
            _ => {}
        }

        debug!("Building genre registry");
        match self.build().await {
            Ok(map) => {
                info!(genres = map.len(), "Genre registry built");
                *state = RegistryState::Loaded(Arc::clone(&map));
                Ok(map)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    cooldown_secs = FAILURE_COOLDOWN.as_secs(),
                    "Genre registry build failed"
                );
                *state = RegistryState::Failed {
                    until: Instant::now() + FAILURE_COOLDOWN,
                    reason: e.kind.to_string(),
                };
                Err(e)
            }
        }
    }

    async fn build(&self) -> Result<Arc<GenreMap>, CatalogFetchError> {
        let movie = self.catalog.genres(ContentKind::Movie).await?;
        let series = self.catalog.genres(ContentKind::Series).await?;
        Ok(Arc::new(GenreMap::merge([movie, series])))
    }

    /// Names for `ids`, building the registry if needed.
    pub async fn names_for(&self, ids: &[u32]) -> Result<Vec<String>, CatalogFetchError> {
        Ok(self.get_all().await?.names_for(ids))
    }

    /// Drop the cached mapping (or a remembered failure); the next lookup
    /// refetches.
    pub async fn invalidate(&self) {
        *self.state.lock().await = RegistryState::Empty;
        info!("Genre registry invalidated");
    }

    pub async fn is_loaded(&self) -> bool {
        matches!(*self.state.lock().await, RegistryState::Loaded(_))
    }
}
