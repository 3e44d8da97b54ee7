use std::sync::Arc;

use crate::application::{ImageResolver, ListPropertyMediaUseCase, MediaListing};
use crate::domain::entities::VersionedUrl;
use crate::domain::ports::MediaSourcePort;
use crate::infrastructure::cache::TtlCache;

/// Shared handles every handler receives.
#[derive(Clone)]
pub struct AppState {
    /// Image resolver.
    pub resolver: ImageResolver,
    /// Property media listing.
    pub media: ListPropertyMediaUseCase,
    /// Upstream, for health probes.
    pub source: Arc<dyn MediaSourcePort>,
    /// Resolved image URLs.
    pub url_cache: Arc<TtlCache<VersionedUrl>>,
    /// Cached listings.
    pub response_cache: Arc<TtlCache<MediaListing>>,
}
