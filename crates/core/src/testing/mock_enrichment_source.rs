//! Mock enrichment source for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::catalog::ContentKind;
use crate::enrichment::{EnrichmentRecord, EnrichmentSource};

/// A recorded lookup for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedLookup {
    ById { external_id: String },
    ByTitle {
        title: String,
        year: Option<i32>,
        kind: ContentKind,
    },
}

/// Mock implementation of the EnrichmentSource trait.
///
/// Provides controllable behavior for testing:
/// - Records keyed by external ID and by lowercase title
/// - Titles whose lookup "fails" (answers `None` like a real failure would)
/// - Per-title delays to shuffle completion order
/// - Tracking of how many lookups were in flight at once
#[derive(Debug, Default)]
pub struct MockEnrichmentSource {
    by_id: Arc<RwLock<HashMap<String, EnrichmentRecord>>>,
    by_title: Arc<RwLock<HashMap<String, EnrichmentRecord>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    delays: Arc<RwLock<HashMap<String, Duration>>>,
    lookups: Arc<RwLock<Vec<RecordedLookup>>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl MockEnrichmentSource {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Answer lookups for this record's external ID.
    pub async fn add_by_id(&self, record: EnrichmentRecord) {
        self.by_id
            .write()
            .await
            .insert(record.external_id.clone(), record);
    }

    /// Answer title lookups for `title` (case-insensitive) with `record`.
    pub async fn add_by_title(&self, title: &str, record: EnrichmentRecord) {
        self.by_title
            .write()
            .await
            .insert(title.to_lowercase(), record);
    }

    /// Lookups for this title answer `None` even if a record is registered.
    pub async fn fail_title(&self, title: &str) {
        self.failing.write().await.insert(title.to_lowercase());
    }

    /// Delay lookups for this title.
    pub async fn set_delay(&self, title: &str, delay: Duration) {
        self.delays.write().await.insert(title.to_lowercase(), delay);
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub async fn recorded_lookups(&self) -> Vec<RecordedLookup> {
        self.lookups.read().await.clone()
    }

    pub async fn lookup_count(&self) -> usize {
        self.lookups.read().await.len()
    }

    /// Highest number of lookups observed in flight at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self, key: &str, lookup: RecordedLookup) {
        self.lookups.write().await.push(lookup);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.delays.read().await.get(key).copied();
        // Yield even without a delay so concurrent lookups overlap.
        match delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }
    }

    fn exit(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl EnrichmentSource for MockEnrichmentSource {
    async fn lookup_by_id(&self, external_id: &str) -> Option<EnrichmentRecord> {
        self.enter(
            external_id,
            RecordedLookup::ById {
                external_id: external_id.to_string(),
            },
        )
        .await;

        let record = self.by_id.read().await.get(external_id).cloned();
        let title_key = record
            .as_ref()
            .and_then(|r| r.title.as_deref())
            .map(str::to_lowercase);
        let failed = match title_key {
            Some(title) => self.failing.read().await.contains(&title),
            None => false,
        };

        self.exit();
        if failed {
            None
        } else {
            record
        }
    }

    async fn lookup_by_title(
        &self,
        title: &str,
        year: Option<i32>,
        kind: ContentKind,
    ) -> Option<EnrichmentRecord> {
        let key = title.to_lowercase();
        self.enter(
            &key,
            RecordedLookup::ByTitle {
                title: title.to_string(),
                year,
                kind,
            },
        )
        .await;

        let failed = self.failing.read().await.contains(&key);
        let record = self.by_title.read().await.get(&key).cloned();

        self.exit();
        if failed {
            None
        } else {
            record
        }
    }
}
