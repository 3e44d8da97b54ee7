//! Upstream media source port definition.

use async_trait::async_trait;

use crate::domain::entities::{MediaRecord, MediaSelector};
use crate::domain::errors::UpstreamError;

/// Port for reading property media from the upstream listing API.
#[async_trait]
pub trait MediaSourcePort: Send + Sync {
    /// Fetches the media records matching `selector`. An unknown filename or
    /// property yields an empty list rather than an error.
    async fn fetch_media(&self, selector: &MediaSelector) -> Result<Vec<MediaRecord>, UpstreamError>;

    /// Checks upstream availability.
    async fn health_check(&self) -> Result<(), UpstreamError>;
}
