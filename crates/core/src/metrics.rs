//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Response caches (hits, misses)
//! - Upstream sources (requests, retries)
//! - Batched enrichment (lookups, batch duration)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts};

// =============================================================================
// Cache Metrics
// =============================================================================

/// Cache lookups by cache name and outcome.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("marquee_cache_lookups_total", "Total response cache lookups"),
        &["cache", "result"], // "hit", "miss"
    )
    .unwrap()
});

// =============================================================================
// Upstream Metrics
// =============================================================================

/// Upstream HTTP requests by source and outcome.
pub static UPSTREAM_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "marquee_upstream_requests_total",
            "Total requests sent to upstream sources",
        ),
        &["source", "outcome"], // "success", "not_found", "error"
    )
    .unwrap()
});

/// Upstream retries by source.
pub static UPSTREAM_RETRIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "marquee_upstream_retries_total",
            "Total retried upstream requests",
        ),
        &["source"],
    )
    .unwrap()
});

// =============================================================================
// Enrichment Metrics
// =============================================================================

/// Enrichment lookups by result.
pub static ENRICHMENT_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "marquee_enrichment_lookups_total",
            "Total per-title enrichment lookups",
        ),
        &["result"], // "matched", "unmatched"
    )
    .unwrap()
});

/// Duration of one enrichment pass over a page of records.
pub static ENRICHMENT_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "marquee_enrichment_duration_seconds",
            "Duration of a batched enrichment pass",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CACHE_LOOKUPS.clone()),
        Box::new(UPSTREAM_REQUESTS.clone()),
        Box::new(UPSTREAM_RETRIES.clone()),
        Box::new(ENRICHMENT_LOOKUPS.clone()),
        Box::new(ENRICHMENT_DURATION.clone()),
    ]
}
