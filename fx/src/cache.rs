//! Upstream rate caching with TTL support.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::FxResult;
use crate::provider::RateTable;

/// Outcome of an in-flight fetch, `None` until it completes.
type Outcome<V> = Option<FxResult<V>>;

/// A caller's role in the fetch for a missing key.
enum Flight<V> {
    /// Runs the fetch and publishes its outcome.
    Leader(watch::Sender<Outcome<V>>),
    /// Waits for the leader's outcome.
    Waiter(watch::Receiver<Outcome<V>>),
}

/// Clears the in-flight marker when the leader finishes or is dropped.
struct Landing<'a, V> {
    in_flight: &'a DashMap<String, watch::Receiver<Outcome<V>>>,
    key: &'a str,
}

impl<V> Drop for Landing<'_, V> {
    fn drop(&mut self) {
        self.in_flight.remove(self.key);
    }
}

/// Cached value entry.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    cached_at: DateTime<Utc>,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            cached_at: Utc::now(),
            ttl,
        }
    }

    fn is_valid(&self) -> bool {
        Utc::now().signed_duration_since(self.cached_at) < self.ttl
    }
}

/// Configuration for a TTL cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL applied to every insert.
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::minutes(1),
        }
    }
}

/// Thread-safe key/value cache where entries expire a fixed time after insert.
///
/// Misses through [`TtlCache::get_or_fetch`] are coalesced per key, so
/// concurrent callers share one upstream call and its outcome.
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    in_flight: DashMap<String, watch::Receiver<Outcome<V>>>,
    config: CacheConfig,
}

impl<V: Clone> TtlCache<V> {
    /// Create a new cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Create a new cache with custom configuration.
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            in_flight: DashMap::new(),
            config,
        }
    }

    /// Create a new cache with the given TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_config(CacheConfig { default_ttl: ttl })
    }

    /// Get a value if present and not expired.
    pub fn get(&self, key: &str) -> Option<V> {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_valid() {
                debug!(key, "Cache hit");
                return Some(entry.value.clone());
            }
            debug!(key, "Cache entry expired");
            drop(entry);
            // A concurrent insert may already have replaced the dead entry.
            self.entries.remove_if(key, |_, entry| !entry.is_valid());
        }

        debug!(key, "Cache miss");
        None
    }

    /// Insert a value, replacing any previous entry for the key.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.entries
            .insert(key.into(), CacheEntry::new(value, self.config.default_ttl));
    }

    /// Return the cached value or run `fetch` and cache its result.
    ///
    /// Only one fetch per key runs at a time. Callers that miss while it is
    /// in flight wait for it and receive its outcome, error included, so an
    /// upstream failure is reported to all of them after a single attempt.
    /// Errors are never cached. If the fetching caller is cancelled, one of
    /// the waiters takes over.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> FxResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FxResult<V>>,
    {
        let outcome = loop {
            if let Some(value) = self.get(key) {
                return Ok(value);
            }

            match self.join_flight(key) {
                Flight::Leader(outcome) => break outcome,
                Flight::Waiter(mut outcome) => {
                    let shared = match outcome.wait_for(|o| o.is_some()).await {
                        Ok(shared) => (*shared).clone(),
                        Err(_) => None,
                    };
                    match shared {
                        Some(result) => {
                            debug!(key, ok = result.is_ok(), "Shared in-flight fetch");
                            return result;
                        }
                        None => debug!(key, "In-flight fetch abandoned, retrying"),
                    }
                }
            }
        };

        let _landing = Landing {
            in_flight: &self.in_flight,
            key,
        };

        let result = match self.get(key) {
            Some(value) => Ok(value),
            None => {
                let result = fetch().await;
                if let Ok(value) = &result {
                    self.insert(key, value.clone());
                }
                result
            }
        };

        outcome.send_replace(Some(result.clone()));
        result
    }

    fn join_flight(&self, key: &str) -> Flight<V> {
        match self.in_flight.entry(key.to_string()) {
            Entry::Occupied(entry) => Flight::Waiter(entry.get().clone()),
            Entry::Vacant(entry) => {
                let (tx, rx) = watch::channel(None);
                entry.insert(rx);
                Flight::Leader(tx)
            }
        }
    }

    /// Get the number of entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evict expired entries.
    pub fn evict_expired(&self) {
        self.entries.retain(|_, entry| entry.is_valid());
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let total = self.entries.len();
        let valid = self.entries.iter().filter(|e| e.is_valid()).count();

        CacheStats {
            total_entries: total,
            valid_entries: valid,
            expired_entries: total - valid,
        }
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
}

impl CacheStats {
    fn merge(self, other: CacheStats) -> CacheStats {
        CacheStats {
            total_entries: self.total_entries + other.total_entries,
            valid_entries: self.valid_entries + other.valid_entries,
            expired_entries: self.expired_entries + other.expired_entries,
        }
    }
}

/// The caches shared by all provider clients, one per value shape.
pub struct RateCaches {
    /// Single-rate results keyed by upstream URL.
    pub scalars: TtlCache<f64>,
    /// Rate tables keyed by upstream URL.
    pub tables: TtlCache<Arc<RateTable>>,
}

impl RateCaches {
    /// Create both caches with the same TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            scalars: TtlCache::with_ttl(ttl),
            tables: TtlCache::with_ttl(ttl),
        }
    }

    /// Evict expired entries from both caches.
    pub fn evict_expired(&self) {
        self.scalars.evict_expired();
        self.tables.evict_expired();
    }

    /// Combined statistics.
    pub fn stats(&self) -> CacheStats {
        self.scalars.stats().merge(self.tables.stats())
    }

    /// Spawn a task that evicts expired entries every `interval`.
    pub fn spawn_janitor(self: Arc<Self>, interval: std::time::Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.evict_expired();
                debug!(stats = ?self.stats(), "Evicted expired rates");
            }
        })
    }
}

impl Default for RateCaches {
    fn default() -> Self {
        Self::new(CacheConfig::default().default_ttl)
    }
}

/// Shared rate caches.
pub type SharedRateCaches = Arc<RateCaches>;
