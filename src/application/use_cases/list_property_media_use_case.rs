//! Property media listing use case.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::application::dto::PropertyImage;
use crate::domain::entities::MediaSelector;
use crate::domain::errors::UpstreamError;
use crate::domain::ports::MediaSourcePort;
use crate::infrastructure::cache::{TtlCache, response_key};

/// Cached listing of one property's images.
pub type MediaListing = Arc<Vec<PropertyImage>>;

#[derive(Serialize)]
struct MediaQuery<'a> {
    propref: &'a str,
}

/// Lists a property's images with links to the image route.
#[derive(Clone)]
pub struct ListPropertyMediaUseCase {
    source: Arc<dyn MediaSourcePort>,
    cache: Arc<TtlCache<MediaListing>>,
    ttl: Duration,
    link_base: String,
}

impl ListPropertyMediaUseCase {
    /// Creates the use case. `link_base` prefixes every generated link.
    #[must_use]
    pub fn new(
        source: Arc<dyn MediaSourcePort>,
        cache: Arc<TtlCache<MediaListing>>,
        ttl: Duration,
        link_base: impl Into<String>,
    ) -> Self {
        Self {
            source,
            cache,
            ttl,
            link_base: link_base.into(),
        }
    }

    /// Returns the images of `property_ref` in display order.
    ///
    /// # Errors
    /// Returns [`UpstreamError`] for a blank reference or a failed fetch.
    pub async fn execute(&self, property_ref: &str) -> Result<MediaListing, UpstreamError> {
        let selector = MediaSelector::by_property(property_ref)?;
        let key = response_key("media", &MediaQuery {
            propref: property_ref.trim(),
        });

        if let Some(listing) = self.cache.get(&key) {
            debug!(propref = property_ref, "Media listing served from cache");
            return Ok(listing);
        }

        let mut records = self.source.fetch_media(&selector).await?;
        records.sort_by_key(|r| r.sort_order);

        let listing: MediaListing = Arc::new(
            records
                .iter()
                .filter_map(|r| PropertyImage::from_record(&self.link_base, r))
                .collect(),
        );

        info!(
            propref = property_ref,
            images = listing.len(),
            skipped = records.len() - listing.len(),
            "Listed property media"
        );

        self.cache.set(key, Arc::clone(&listing), self.ttl);
        Ok(listing)
    }
}
