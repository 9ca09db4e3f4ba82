//! Batched enrichment: bounded-concurrency lookups merged back in input order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::CanonicalRecord;
use crate::enrichment::{EnrichmentRecord, EnrichmentSource};
use crate::merge::{merge, MergedRecord};
use crate::metrics::{ENRICHMENT_DURATION, ENRICHMENT_LOOKUPS};

/// Default number of lookups per batch.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Identifies one enrichment pass. Later passes always carry larger tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestToken(pub u64);

/// Output of one enrichment pass.
#[derive(Debug, Clone)]
pub struct EnrichedBatch {
    pub token: RequestToken,
    /// One merged record per input record, in input order.
    pub records: Vec<MergedRecord>,
}

/// Runs enrichment lookups for a list of records in fixed-size batches.
///
/// Each batch of `concurrency` records is looked up concurrently and fully
/// awaited before the next batch starts. Lookups that find nothing (or fail
/// inside the source) leave their record with primary data only.
pub struct BatchEnricher {
    source: Arc<dyn EnrichmentSource>,
    concurrency: usize,
    latest: AtomicU64,
}

impl BatchEnricher {
    pub fn new(source: Arc<dyn EnrichmentSource>) -> Self {
        Self::with_concurrency(source, DEFAULT_CONCURRENCY)
    }

    /// A concurrency of zero is treated as one.
    pub fn with_concurrency(source: Arc<dyn EnrichmentSource>, concurrency: usize) -> Self {
        Self {
            source,
            concurrency: concurrency.max(1),
            latest: AtomicU64::new(0),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Enrich `records` with the configured concurrency.
    pub async fn enrich(&self, records: &[CanonicalRecord]) -> EnrichedBatch {
        self.enrich_with_concurrency(records, self.concurrency).await
    }

    pub async fn enrich_with_concurrency(
        &self,
        records: &[CanonicalRecord],
        concurrency: usize,
    ) -> EnrichedBatch {
        let token = self.next_token();
        let concurrency = concurrency.max(1);
        let started = Instant::now();
        debug!(
            token = token.0,
            records = records.len(),
            concurrency,
            "Starting enrichment pass"
        );

        let mut found: Vec<Option<EnrichmentRecord>> = vec![None; records.len()];
        for (batch_index, batch) in records.chunks(concurrency).enumerate() {
            let offset = batch_index * concurrency;
            let lookups = batch
                .iter()
                .enumerate()
                .map(|(i, record)| async move { (offset + i, self.lookup(record).await) });

            for (index, result) in join_all(lookups).await {
                found[index] = result;
            }
        }

        let matched = found.iter().filter(|r| r.is_some()).count();
        ENRICHMENT_LOOKUPS
            .with_label_values(&["matched"])
            .inc_by(matched as u64);
        ENRICHMENT_LOOKUPS
            .with_label_values(&["unmatched"])
            .inc_by((records.len() - matched) as u64);
        ENRICHMENT_DURATION.observe(started.elapsed().as_secs_f64());

        let merged = records
            .iter()
            .zip(&found)
            .map(|(record, extra)| merge(record, extra.as_ref()))
            .collect();

        info!(
            token = token.0,
            records = records.len(),
            matched,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Enrichment pass complete"
        );

        EnrichedBatch {
            token,
            records: merged,
        }
    }

    /// Look up one record: by external ID when known, else by title.
    async fn lookup(&self, record: &CanonicalRecord) -> Option<EnrichmentRecord> {
        match record.external_id.as_deref() {
            Some(id) if !id.trim().is_empty() => self.source.lookup_by_id(id).await,
            _ => {
                self.source
                    .lookup_by_title(&record.title, record.year, record.kind)
                    .await
            }
        }
    }

    fn next_token(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Token of the most recently started pass.
    pub fn latest_token(&self) -> RequestToken {
        RequestToken(self.latest.load(Ordering::SeqCst))
    }

    /// True when no pass has started since the one that produced `token`.
    pub fn is_current(&self, token: RequestToken) -> bool {
        token == self.latest_token()
    }
}

/// Caller-side filter that drops results of superseded passes.
///
/// Responses may arrive out of order; once a token has been accepted, any
/// older token is rejected.
#[derive(Debug, Default)]
pub struct StaleGuard {
    newest: Option<RequestToken>,
}

impl StaleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` unless a newer one was already accepted.
    pub fn accept(&mut self, token: RequestToken) -> bool {
        match self.newest {
            Some(newest) if token < newest => {
                debug!(token = token.0, newest = newest.0, "Discarding stale enrichment result");
                false
            }
            _ => {
                self.newest = Some(token);
                true
            }
        }
    }

    pub fn newest(&self) -> Option<RequestToken> {
        self.newest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockEnrichmentSource, RecordedLookup};
    use std::time::Duration;

    fn movies(count: u64) -> Vec<CanonicalRecord> {
        (0..count)
            .map(|i| fixtures::movie(i + 1, &format!("Movie {}", i), 2000 + i as i32))
            .collect()
    }

    async fn source_for(records: &[CanonicalRecord]) -> Arc<MockEnrichmentSource> {
        let source = Arc::new(MockEnrichmentSource::new());
        for (i, record) in records.iter().enumerate() {
            let mut extra = fixtures::enrichment_record(&format!("tt{:07}", i));
            extra.rating = Some(9.0);
            source.add_by_title(&record.title, extra).await;
        }
        source
    }

    #[tokio::test]
    async fn test_failed_lookup_is_isolated() {
        let records = movies(7);
        let source = source_for(&records).await;
        source.fail_title("Movie 3").await;
        let enricher = BatchEnricher::new(source.clone());

        let batch = enricher.enrich(&records).await;

        assert_eq!(batch.records.len(), 7);
        for (i, merged) in batch.records.iter().enumerate() {
            assert_eq!(merged.id, records[i].id);
            assert_eq!(merged.enriched, i != 3);
        }
        assert_eq!(batch.records[3].rating, records[3].rating);
        assert_eq!(batch.records[3].plot, records[3].plot);
        assert_eq!(batch.records[2].rating, 9.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_survives_out_of_order_completion() {
        let records = movies(5);
        let source = source_for(&records).await;
        source.set_delay("Movie 0", Duration::from_millis(300)).await;
        source.set_delay("Movie 1", Duration::from_millis(200)).await;
        source.set_delay("Movie 2", Duration::from_millis(100)).await;
        let enricher = BatchEnricher::new(source.clone());

        let batch = enricher.enrich(&records).await;

        let ids: Vec<u64> = batch.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(
            batch.records[0].external_id.as_deref(),
            Some("tt0000000")
        );
        assert_eq!(
            batch.records[4].external_id.as_deref(),
            Some("tt0000004")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_batches_wait_for_each_other() {
        let records = movies(4);
        let source = source_for(&records).await;
        source.set_delay("Movie 0", Duration::from_millis(100)).await;
        source.set_delay("Movie 1", Duration::from_millis(10)).await;
        source.set_delay("Movie 2", Duration::from_millis(10)).await;
        source.set_delay("Movie 3", Duration::from_millis(100)).await;
        let enricher = BatchEnricher::with_concurrency(source.clone(), 2);

        let start = tokio::time::Instant::now();
        enricher.enrich(&records).await;

        // A sliding window would finish after 120ms.
        assert_eq!(start.elapsed(), Duration::from_millis(200));
        assert_eq!(source.peak_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_concurrency_bounds_in_flight_lookups() {
        let records = movies(12);
        let source = source_for(&records).await;
        let enricher = BatchEnricher::new(source.clone());

        enricher.enrich(&records).await;

        assert_eq!(source.peak_in_flight(), DEFAULT_CONCURRENCY);
        assert_eq!(source.lookup_count().await, 12);
    }

    #[tokio::test]
    async fn test_zero_concurrency_runs_sequentially() {
        let records = movies(3);
        let source = source_for(&records).await;
        let enricher = BatchEnricher::with_concurrency(source.clone(), 0);

        let batch = enricher.enrich(&records).await;

        assert_eq!(enricher.concurrency(), 1);
        assert_eq!(batch.records.len(), 3);
        assert_eq!(source.peak_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_lookup_prefers_external_id() {
        let mut record = fixtures::movie(603, "The Matrix", 1999);
        record.external_id = Some("tt0133093".to_string());
        let source = Arc::new(MockEnrichmentSource::new());
        source
            .add_by_id(fixtures::enrichment_record("tt0133093"))
            .await;
        let enricher = BatchEnricher::new(source.clone());

        let batch = enricher.enrich(&[record]).await;

        assert!(batch.records[0].enriched);
        assert_eq!(
            source.recorded_lookups().await,
            vec![RecordedLookup::ById {
                external_id: "tt0133093".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_pass_duration_is_observed() {
        let records = movies(2);
        let source = source_for(&records).await;
        let enricher = BatchEnricher::new(source);
        let before = ENRICHMENT_DURATION.get_sample_count();

        enricher.enrich(&records).await;

        // Other tests share the histogram, so only a lower bound holds.
        assert!(ENRICHMENT_DURATION.get_sample_count() > before);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let enricher = BatchEnricher::new(Arc::new(MockEnrichmentSource::new()));
        let batch = enricher.enrich(&[]).await;
        assert!(batch.records.is_empty());
        assert_eq!(batch.token, RequestToken(1));
    }

    #[tokio::test]
    async fn test_tokens_increase() {
        let enricher = BatchEnricher::new(Arc::new(MockEnrichmentSource::new()));
        assert_eq!(enricher.latest_token(), RequestToken(0));

        let first = enricher.enrich(&[]).await.token;
        assert!(enricher.is_current(first));

        let second = enricher.enrich(&[]).await.token;
        assert!(second > first);
        assert!(!enricher.is_current(first));
        assert!(enricher.is_current(second));
    }

    #[test]
    fn test_stale_guard_discards_older_tokens() {
        let mut guard = StaleGuard::new();

        assert!(guard.accept(RequestToken(2)));
        assert!(!guard.accept(RequestToken(1)));
        assert!(guard.accept(RequestToken(2)));
        assert!(guard.accept(RequestToken(5)));
        assert!(!guard.accept(RequestToken(3)));
        assert_eq!(guard.newest(), Some(RequestToken(5)));
    }
}
