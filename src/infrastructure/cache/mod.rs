//! In-process caching.

pub mod ttl_cache;

pub use ttl_cache::{CacheStats, DEFAULT_CAPACITY, TtlCache, response_key};
