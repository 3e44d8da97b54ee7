//! Port definition for the resolved-URL cache.

use std::time::Duration;

use crate::domain::entities::VersionedUrl;

/// Port for caching resolved image URLs.
///
/// Lookups are synchronous and in-memory: a cache hit must never suspend.
pub trait UrlCachePort: Send + Sync {
    /// Returns the live URL stored under `key`, or `None` if absent or expired.
    fn lookup(&self, key: &str) -> Option<VersionedUrl>;

    /// Stores `url` under `key` for `ttl`.
    fn store(&self, key: String, url: VersionedUrl, ttl: Duration);

    /// Removes every entry whose key starts with `prefix`. Returns how many were removed.
    fn evict_prefix(&self, prefix: &str) -> usize;
}
