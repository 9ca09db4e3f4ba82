//! Catalog service: primary listings, enrichment and genre names in one call.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::{
    CanonicalRecord, CastMember, CatalogFetchError, ContentKind, CrewMember, DiscoverFilters,
    Genre, Page, PrimaryCatalog,
};
use crate::enricher::{BatchEnricher, RequestToken};
use crate::genres::{GenreRegistry, UNKNOWN_GENRE};
use crate::merge::{merge, MergedRecord};
use crate::pagination::{
    items_range, page_window, pagination_info, ItemsRange, PaginationState, DEFAULT_MAX_VISIBLE,
};

/// Results per page reported by the primary source.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// A merged record with its genre names resolved.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedTitle {
    #[serde(flatten)]
    pub record: MergedRecord,
    pub genre_names: Vec<String>,
}

/// One listing page, enriched.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedPage {
    pub results: Vec<EnrichedTitle>,
    pub pagination: PaginationState,
    pub page_window: Vec<u32>,
    pub items_range: ItemsRange,
    /// Token of the enrichment pass, absent when enrichment is disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_token: Option<RequestToken>,
}

/// Full details for one title, enriched.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedDetails {
    #[serde(flatten)]
    pub title: EnrichedTitle,
    pub credits: Vec<CastMember>,
    pub crew: Vec<CrewMember>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_seasons: Option<u32>,
    pub similar: Vec<CanonicalRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_token: Option<RequestToken>,
}

/// Orchestrates the primary catalog, the batch enricher and the genre
/// registry. Built once at startup and shared.
///
/// Primary failures fail the call. Enrichment never does, and a genre
/// registry failure only degrades names to the placeholder.
pub struct CatalogService {
    catalog: Arc<dyn PrimaryCatalog>,
    enricher: Option<BatchEnricher>,
    genres: GenreRegistry,
    page_size: u32,
}

impl CatalogService {
    /// `enricher` is optional: without it, pages carry primary data only.
    pub fn new(catalog: Arc<dyn PrimaryCatalog>, enricher: Option<BatchEnricher>) -> Self {
        Self {
            genres: GenreRegistry::new(Arc::clone(&catalog)),
            catalog,
            enricher,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Override the page size used for item ranges.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn enrichment_enabled(&self) -> bool {
        self.enricher.is_some()
    }

    pub fn enricher(&self) -> Option<&BatchEnricher> {
        self.enricher.as_ref()
    }

    pub fn genre_registry(&self) -> &GenreRegistry {
        &self.genres
    }

    pub async fn trending(&self, page: u32) -> Result<EnrichedPage, CatalogFetchError> {
        let listing = self.catalog.trending(page.max(1)).await?;
        Ok(self.enrich_page(listing).await)
    }

    pub async fn search(&self, query: &str, page: u32) -> Result<EnrichedPage, CatalogFetchError> {
        let listing = self.catalog.search(query, page.max(1)).await?;
        Ok(self.enrich_page(listing).await)
    }

    pub async fn discover(
        &self,
        filters: &DiscoverFilters,
    ) -> Result<EnrichedPage, CatalogFetchError> {
        let listing = self.catalog.discover(filters).await?;
        Ok(self.enrich_page(listing).await)
    }

    pub async fn title(
        &self,
        id: u64,
        kind: ContentKind,
    ) -> Result<EnrichedDetails, CatalogFetchError> {
        let details = self.catalog.details(id, kind).await?;

        let (record, request_token) = match &self.enricher {
            Some(enricher) => {
                let batch = enricher.enrich(std::slice::from_ref(&details.record)).await;
                let record = batch
                    .records
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| merge(&details.record, None));
                (record, Some(batch.token))
            }
            None => (merge(&details.record, None), None),
        };

        let genre_names = if details.genres.is_empty() {
            self.genre_names(&[record.genre_ids.clone()])
                .await
                .pop()
                .unwrap_or_default()
        } else {
            details.genres.iter().map(|g| g.name.clone()).collect()
        };

        Ok(EnrichedDetails {
            title: EnrichedTitle {
                record,
                genre_names,
            },
            credits: details.cast,
            crew: details.crew,
            tagline: details.tagline,
            status: details.status,
            number_of_seasons: details.number_of_seasons,
            similar: details.similar,
            request_token,
        })
    }

    /// Combined genre list of both taxonomies.
    pub async fn genres(&self) -> Result<Vec<Genre>, CatalogFetchError> {
        Ok(self.genres.get_all().await?.genres().to_vec())
    }

    pub async fn refresh_genres(&self) {
        self.genres.invalidate().await;
    }

    async fn enrich_page(&self, listing: Page<CanonicalRecord>) -> EnrichedPage {
        let (merged, request_token) = match &self.enricher {
            Some(enricher) => {
                let batch = enricher.enrich(&listing.results).await;
                (batch.records, Some(batch.token))
            }
            None => (
                listing.results.iter().map(|r| merge(r, None)).collect(),
                None,
            ),
        };

        let id_lists: Vec<Vec<u32>> = merged.iter().map(|r| r.genre_ids.clone()).collect();
        let names = self.genre_names(&id_lists).await;

        let results = merged
            .into_iter()
            .zip(names)
            .map(|(record, genre_names)| EnrichedTitle {
                record,
                genre_names,
            })
            .collect();

        let page = listing.page.max(1);
        debug!(
            page,
            total_pages = listing.total_pages,
            total_results = listing.total_results,
            "Listing page enriched"
        );

        EnrichedPage {
            results,
            pagination: pagination_info(page, listing.total_pages, listing.total_results),
            page_window: page_window(page, listing.total_pages, DEFAULT_MAX_VISIBLE),
            items_range: items_range(page, self.page_size, listing.total_results),
            request_token,
        }
    }

    async fn genre_names(&self, id_lists: &[Vec<u32>]) -> Vec<Vec<String>> {
        match self.genres.get_all().await {
            Ok(map) => id_lists.iter().map(|ids| map.names_for(ids)).collect(),
            Err(e) => {
                warn!(error = %e, "Genre registry unavailable, using placeholder names");
                id_lists
                    .iter()
                    .map(|ids| vec![UNKNOWN_GENRE.to_string(); ids.len()])
                    .collect()
            }
        }
    }
}
