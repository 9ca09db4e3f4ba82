//! Mock primary catalog for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::{
    CanonicalRecord, CatalogErrorKind, CatalogFetchError, ContentKind, DiscoverFilters, Genre,
    Page, PrimaryCatalog, TitleDetails,
};

/// A recorded catalog query for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCatalogQuery {
    Trending { page: u32 },
    Search { query: String, page: u32 },
    Discover { filters: DiscoverFilters },
    Details { id: u64, kind: ContentKind },
    Genres { kind: ContentKind },
}

/// Mock implementation of the PrimaryCatalog trait.
///
/// Listings are served from one pool of titles, split into pages of
/// `page_size`:
/// - trending returns the pool as-is
/// - search matches titles case-insensitively
/// - discover filters by kind, genres, year and minimum rating
///
/// # Example
///
/// ```rust,ignore
/// use marquee_core::testing::{MockPrimaryCatalog, fixtures};
///
/// let catalog = MockPrimaryCatalog::new();
/// catalog.set_titles(vec![fixtures::movie(1, "The Matrix", 1999)]).await;
///
/// let page = catalog.search("matrix", 1).await?;
/// assert_eq!(page.results.len(), 1);
/// ```
#[derive(Debug)]
pub struct MockPrimaryCatalog {
    titles: Arc<RwLock<Vec<CanonicalRecord>>>,
    details: Arc<RwLock<HashMap<(u64, ContentKind), TitleDetails>>>,
    genres: Arc<RwLock<HashMap<ContentKind, Vec<Genre>>>>,
    page_size: usize,
    queries: Arc<RwLock<Vec<RecordedCatalogQuery>>>,
    /// If set, the next operation will fail with this error kind.
    next_error: Arc<RwLock<Option<CatalogErrorKind>>>,
    /// If set, every genre lookup fails.
    fail_genres: Arc<RwLock<bool>>,
}

impl Default for MockPrimaryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPrimaryCatalog {
    /// Create a new empty mock catalog with 20 results per page.
    pub fn new() -> Self {
        Self::with_page_size(20)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            titles: Arc::new(RwLock::new(Vec::new())),
            details: Arc::new(RwLock::new(HashMap::new())),
            genres: Arc::new(RwLock::new(HashMap::new())),
            page_size: page_size.max(1),
            queries: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            fail_genres: Arc::new(RwLock::new(false)),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Replace the title pool.
    pub async fn set_titles(&self, titles: Vec<CanonicalRecord>) {
        *self.titles.write().await = titles;
    }

    /// Register full details for one title.
    pub async fn add_details(&self, details: TitleDetails) {
        let key = (details.record.id, details.record.kind);
        self.details.write().await.insert(key, details);
    }

    /// Set the genre taxonomy for one kind.
    pub async fn set_genres(&self, kind: ContentKind, genres: Vec<Genre>) {
        self.genres.write().await.insert(kind, genres);
    }

    /// Make every genre lookup fail (or succeed again).
    pub async fn set_fail_genres(&self, fail: bool) {
        *self.fail_genres.write().await = fail;
    }

    // =========================================================================
    // Query Recording
    // =========================================================================

    /// Get all recorded queries.
    pub async fn recorded_queries(&self) -> Vec<RecordedCatalogQuery> {
        self.queries.read().await.clone()
    }

    /// Get the number of queries performed.
    pub async fn query_count(&self) -> usize {
        self.queries.read().await.len()
    }

    /// Clear recorded queries.
    pub async fn clear_recorded(&self) {
        self.queries.write().await.clear();
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: CatalogErrorKind) {
        *self.next_error.write().await = Some(error);
    }

    /// Clear any pending error.
    pub async fn clear_next_error(&self) {
        *self.next_error.write().await = None;
    }

    async fn take_error(&self, operation: &'static str) -> Result<(), CatalogFetchError> {
        match self.next_error.write().await.take() {
            Some(kind) => Err(CatalogFetchError::new(operation, kind)),
            None => Ok(()),
        }
    }

    async fn record(&self, query: RecordedCatalogQuery) {
        self.queries.write().await.push(query);
    }

    fn paginate(&self, matches: Vec<CanonicalRecord>, page: u32) -> Page<CanonicalRecord> {
        let page = page.max(1);
        let total_results = matches.len();
        let total_pages = total_results.div_ceil(self.page_size);
        let results = matches
            .into_iter()
            .skip((page as usize - 1) * self.page_size)
            .take(self.page_size)
            .collect();

        Page {
            results,
            page,
            total_pages: total_pages as u32,
            total_results: total_results as u32,
        }
    }
}

#[async_trait]
impl PrimaryCatalog for MockPrimaryCatalog {
    async fn trending(&self, page: u32) -> Result<Page<CanonicalRecord>, CatalogFetchError> {
        self.take_error("trending").await?;
        self.record(RecordedCatalogQuery::Trending { page }).await;

        let titles = self.titles.read().await.clone();
        Ok(self.paginate(titles, page))
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

        self.take_error("search").await?;
        self.record(RecordedCatalogQuery::Search {
            query: query.to_string(),
            page,
        })
        .await;

        let query_lower = query.to_lowercase();
        let matches: Vec<CanonicalRecord> = self
            .titles
            .read()
            .await
            .iter()
            .filter(|t| t.title.to_lowercase().contains(&query_lower))
            .cloned()
            .collect();
        Ok(self.paginate(matches, page))
    }

    async fn discover(
        &self,
        filters: &DiscoverFilters,
    ) -> Result<Page<CanonicalRecord>, CatalogFetchError> {
        self.take_error("discover").await?;
        self.record(RecordedCatalogQuery::Discover {
            filters: filters.clone(),
        })
        .await;

        let matches: Vec<CanonicalRecord> = self
            .titles
            .read()
            .await
            .iter()
            .filter(|t| t.kind == filters.kind)
            .filter(|t| filters.genre_ids.iter().all(|g| t.genre_ids.contains(g)))
            .filter(|t| filters.year.map_or(true, |y| t.year == Some(y)))
            .filter(|t| filters.min_rating.map_or(true, |r| t.rating >= r))
            .cloned()
            .collect();
        Ok(self.paginate(matches, filters.page))
    }

    async fn details(&self, id: u64, kind: ContentKind) -> Result<TitleDetails, CatalogFetchError> {
        self.take_error("details").await?;
        self.record(RecordedCatalogQuery::Details { id, kind }).await;

        if let Some(details) = self.details.read().await.get(&(id, kind)) {
            return Ok(details.clone());
        }

        // Fall back to a bare record from the pool.
        self.titles
            .read()
            .await
            .iter()
            .find(|t| t.id == id && t.kind == kind)
            .map(|record| TitleDetails {
                record: record.clone(),
                genres: Vec::new(),
                cast: Vec::new(),
                crew: Vec::new(),
                tagline: None,
                status: None,
                number_of_seasons: None,
                similar: Vec::new(),
            })
            .ok_or_else(|| {
                CatalogFetchError::new(
                    "details",
                    CatalogErrorKind::NotFound(format!("{} {}", kind.catalog_segment(), id)),
                )
            })
    }

    async fn genres(&self, kind: ContentKind) -> Result<Vec<Genre>, CatalogFetchError> {
        self.take_error("genres").await?;
        self.record(RecordedCatalogQuery::Genres { kind }).await;

        if *self.fail_genres.read().await {
            return Err(CatalogFetchError::new(
                "genres",
                CatalogErrorKind::Unavailable("genre lookup disabled".to_string()),
            ));
        }

        Ok(self
            .genres
            .read()
            .await
            .get(&kind)
            .cloned()
            .unwrap_or_default())
    }
}
