//! Bounded, TTL-based memoization store for upstream responses.
//!
//! Entries expire lazily: an expired entry is only dropped when a read finds
//! it. When the store is full, the oldest-inserted entry is evicted (FIFO),
//! regardless of how recently it was read.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::time::{Duration, Instant};

use crate::config::CacheConfig;
use crate::metrics::CACHE_LOOKUPS;

/// Default capacity when none is configured.
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Default time-to-live when none is configured.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Snapshot of a cache's occupancy and hit counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub name: String,
    pub entries: usize,
    pub max_entries: usize,
    pub ttl_secs: u64,
    pub hits: u64,
    pub misses: u64,
}

/// Something that owns response caches the operator may inspect or flush.
pub trait CacheControl: Send + Sync {
    fn cache_stats(&self) -> Vec<CacheStats>;

    fn clear_cache(&self);
}

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

struct CacheInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// Keys in insertion order, oldest first.
    order: VecDeque<String>,
    hits: u64,
    misses: u64,
}

impl<V> CacheInner<V> {
    fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
        }
    }
}

/// Thread-safe response cache keyed by caller-built strings.
///
/// Keys must encode the full identity of a request (operation plus every
/// parameter) so that identical logical requests collide.
pub struct ResponseCache<V> {
    name: &'static str,
    max_entries: usize,
    ttl: Duration,
    inner: Mutex<CacheInner<V>>,
}

impl<V: Clone> ResponseCache<V> {
    /// Create a cache with the given capacity and time-to-live.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(name: &'static str, max_entries: usize, ttl: Duration) -> Self {
        Self {
            name,
            max_entries: max_entries.max(1),
            ttl,
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Create a cache with the default capacity (100) and TTL (5 minutes).
    pub fn with_defaults(name: &'static str) -> Self {
        Self::new(name, DEFAULT_MAX_ENTRIES, DEFAULT_TTL)
    }

    /// Create a cache from the `[cache]` config section.
    pub fn from_config(name: &'static str, config: &CacheConfig) -> Self {
        Self::new(name, config.max_entries, Duration::from_secs(config.ttl_secs))
    }

    /// Look up a key. Expired entries are removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut inner = self.lock();

        let state = match inner.entries.get(key) {
            Some(entry) if now <= entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                inner.remove(key);
                None
            }
            None => None,
        };

        match state {
            Some(value) => {
                inner.hits += 1;
                CACHE_LOOKUPS.with_label_values(&[self.name, "hit"]).inc();
                Some(value)
            }
            None => {
                inner.misses += 1;
                CACHE_LOOKUPS.with_label_values(&[self.name, "miss"]).inc();
                None
            }
        }
    }

    /// Store a value. Re-setting an existing key replaces it and counts as a
    /// fresh insertion; otherwise a full cache first evicts its oldest entry.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let expires_at = Instant::now() + self.ttl;
        let mut inner = self.lock();

        if inner.entries.contains_key(&key) {
            inner.remove(&key);
        } else {
            while inner.entries.len() >= self.max_entries {
                match inner.order.pop_front() {
                    Some(oldest) => {
                        inner.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
        }

        inner.order.push_back(key.clone());
        inner.entries.insert(key, CacheEntry { value, expires_at });
    }

    /// Drop every entry. Hit counters are kept.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    /// Number of stored entries, including expired ones not yet read.
    pub fn size(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            name: self.name.to_string(),
            entries: inner.entries.len(),
            max_entries: self.max_entries,
            ttl_secs: self.ttl.as_secs(),
            hits: inner.hits,
            misses: inner.misses,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner<V>> {
        // Every mutation completes before the guard drops, so a poisoned
        // lock still holds a consistent map.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V> std::fmt::Debug for ResponseCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("name", &self.name)
            .field("max_entries", &self.max_entries)
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::time::advance;

    #[test]
    fn test_get_missing_key() {
        let cache: ResponseCache<String> = ResponseCache::with_defaults("test");
        assert!(cache.get("nope").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_set_then_get() {
        let cache = ResponseCache::with_defaults("test");
        cache.set("trending:page=1", vec![1, 2, 3]);

        assert_eq!(cache.get("trending:page=1"), Some(vec![1, 2, 3]));
        assert_eq!(cache.size(), 1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_fifo_eviction() {
        let cache = ResponseCache::new("test", 2, Duration::from_secs(60));
        cache.set("A", 1);
        cache.set("B", 2);
        cache.set("C", 3);

        assert!(cache.get("A").is_none());
        assert_eq!(cache.get("B"), Some(2));
        assert_eq!(cache.get("C"), Some(3));
        assert_eq!(cache.size(), 2);
    }

    #[test]
    fn test_eviction_ignores_reads() {
        let cache = ResponseCache::new("test", 2, Duration::from_secs(60));
        cache.set("A", 1);
        cache.set("B", 2);

        // Reading A does not protect it: eviction is by insertion order.
        assert_eq!(cache.get("A"), Some(1));
        cache.set("C", 3);

        assert!(cache.get("A").is_none());
        assert_eq!(cache.get("B"), Some(2));
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let cache = ResponseCache::new("test", 2, Duration::from_secs(60));
        cache.set("A", 1);
        cache.set("B", 2);
        cache.set("A", 10);

        assert_eq!(cache.size(), 2);
        assert_eq!(cache.get("A"), Some(10));

        // A was re-inserted after B, so B is now the oldest.
        cache.set("C", 3);
        assert!(cache.get("B").is_none());
        assert_eq!(cache.get("A"), Some(10));
    }

    #[test]
    fn test_clear() {
        let cache = ResponseCache::with_defaults("test");
        cache.set("A", 1);
        cache.set("B", 2);
        cache.clear();

        assert_eq!(cache.size(), 0);
        assert!(cache.is_empty());
        assert!(cache.get("A").is_none());
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let cache = ResponseCache::new("test", 0, Duration::from_secs(60));
        cache.set("A", 1);
        assert_eq!(cache.get("A"), Some(1));
        assert_eq!(cache.stats().max_entries, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_boundary() {
        let ttl = Duration::from_millis(1000);
        let cache = ResponseCache::new("test", 10, ttl);
        cache.set("A", "value");

        advance(Duration::from_millis(999)).await;
        assert_eq!(cache.get("A"), Some("value"));

        advance(Duration::from_millis(2)).await;
        assert!(cache.get("A").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_removed_on_read() {
        let cache = ResponseCache::new("test", 10, Duration::from_secs(1));
        cache.set("A", 1);
        cache.set("B", 2);

        advance(Duration::from_secs(2)).await;

        // No background sweep: both entries still occupy the store.
        assert_eq!(cache.size(), 2);
        assert!(cache.get("A").is_none());
        assert_eq!(cache.size(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_refreshes_expiry() {
        let cache = ResponseCache::new("test", 10, Duration::from_secs(10));
        cache.set("A", 1);
        advance(Duration::from_secs(8)).await;
        cache.set("A", 2);
        advance(Duration::from_secs(8)).await;

        assert_eq!(cache.get("A"), Some(2));
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        let cache = Arc::new(ResponseCache::new("test", 50, Duration::from_secs(60)));

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move {
                    for i in 0..100 {
                        let key = format!("w{}:{}", worker, i);
                        cache.set(key.clone(), i);
                        if let Some(v) = cache.get(&key) {
                            assert_eq!(v, i);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(cache.size(), 50);
    }
}
