//! Bounded in-memory key/value cache with per-entry expiry.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use lru::LruCache;
use parking_lot::Mutex;
use regex::Regex;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::domain::entities::VersionedUrl;
use crate::domain::ports::UrlCachePort;

/// Default maximum number of entries.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Longest lifetime an entry can get; larger TTLs are clamped to it.
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

fn expiry(ttl: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(ttl.min(MAX_TTL)).unwrap_or(now)
}

/// Key/value cache with lazy per-entry expiry and oldest-first eviction.
///
/// Entries are kept in insertion order: reads never promote, so when the cache
/// is full the entry inserted (or last re-set) longest ago is evicted.
pub struct TtlCache<V> {
    entries: Mutex<LruCache<String, Entry<V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> TtlCache<V> {
    /// Creates a new cache with the specified capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the live value under `key`. Expired entries are dropped and reported absent.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock();
        let now = Instant::now();

        let live = entries
            .peek(key)
            .map(|entry| (entry.expires_at > now).then(|| entry.value.clone()));

        match live {
            Some(Some(value)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(key, "Cache hit");
                Some(value)
            }
            Some(None) => {
                entries.pop(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                trace!(key, "Cache entry expired");
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                trace!(key, "Cache miss");
                None
            }
        }
    }

    /// Stores `value` under `key` for `ttl`, evicting the oldest entry when full.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let entry = Entry {
            value,
            expires_at: expiry(ttl),
        };

        let mut entries = self.entries.lock();
        // Re-inserting moves the key to the newest position.
        entries.pop(&key);
        if let Some((evicted, _)) = entries.push(key, entry) {
            debug!(key = %evicted, "Evicted oldest cache entry");
        }
    }

    /// Removes `key`. Returns true if it was present.
    pub fn delete(&self, key: &str) -> bool {
        self.entries.lock().pop(key).is_some()
    }

    /// Removes every entry whose key matches `pattern`. Returns how many were removed.
    pub fn clear_matching(&self, pattern: &Regex) -> usize {
        let mut entries = self.entries.lock();
        let doomed: Vec<String> = entries
            .iter()
            .filter(|(key, _)| pattern.is_match(key))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &doomed {
            entries.pop(key);
        }

        if !doomed.is_empty() {
            debug!(pattern = %pattern, removed = doomed.len(), "Cleared matching cache entries");
        }
        doomed.len()
    }

    /// Drops every expired entry. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.expires_at <= now)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            entries.pop(key);
        }
        expired.len()
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
        debug!("Cleared cache");
    }

    /// Returns the number of stored entries, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns cache statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        let entries = self.entries.lock();
        CacheStats {
            hits,
            misses,
            hit_rate,
            size: entries.len(),
            capacity: entries.cap().get(),
        }
    }
}

impl<V: Clone + Send + 'static> TtlCache<V> {
    /// Spawns a task that sweeps expired entries every `interval`.
    ///
    /// Expiry is already enforced on read; the sweep only reclaims memory.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let removed = cache.sweep_expired();
                if removed > 0 {
                    debug!(removed, "Swept expired cache entries");
                }
            }
        })
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Builds a `{domain}:{serialized-params}` key for a cached query result.
#[must_use]
pub fn response_key(domain: &str, params: &impl Serialize) -> String {
    let params = serde_json::to_string(params).unwrap_or_default();
    format!("{domain}:{params}")
}

/// Statistics about cache performance.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
    /// Current number of entries.
    pub size: usize,
    /// Maximum number of entries.
    pub capacity: usize,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {}/{} entries, {:.1}% hit rate ({} hits, {} misses)",
            self.size, self.capacity, self.hit_rate, self.hits, self.misses
        )
    }
}

impl UrlCachePort for TtlCache<VersionedUrl> {
    fn lookup(&self, key: &str) -> Option<VersionedUrl> {
        self.get(key)
    }

    fn store(&self, key: String, url: VersionedUrl, ttl: Duration) {
        self.set(key, url, ttl);
    }

    fn evict_prefix(&self, prefix: &str) -> usize {
        match Regex::new(&format!("^{}", regex::escape(prefix))) {
            Ok(pattern) => self.clear_matching(&pattern),
            Err(_) => 0,
        }
    }
}
