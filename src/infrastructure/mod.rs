//! Infrastructure layer with external service adapters.

/// In-memory TTL caches.
pub mod cache;
/// Cloudinary image store.
pub mod cdn;
/// Gateway configuration.
pub mod config;
/// Rentman listing API client.
pub mod rentman;

pub use cache::{CacheStats, TtlCache, response_key};
pub use cdn::CloudinaryStore;
pub use config::{AppConfig, CliArgs, ConfigLoader, LogLevel};
pub use rentman::{RentmanClient, RetryPolicy};
