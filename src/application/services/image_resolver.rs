//! Image resolution: cache first, CDN second, upstream fetch and upload last.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::inflight::InFlightRegistry;
use crate::domain::entities::{
    ImageIdentifier, MediaSelector, RawImageRecord, SizeVariant, VariantUrls, VersionedUrl,
    image_cache_key,
};
use crate::domain::errors::{ResolveError, UpstreamError};
use crate::domain::ports::{ImageStorePort, MediaSourcePort, UrlCachePort};

/// Tunables for [`ImageResolver`].
#[derive(Debug, Clone, Copy)]
pub struct ResolverConfig {
    /// Lifetime of a cached image URL.
    pub image_ttl: Duration,
    /// Bound on the upstream fetch inside an upload.
    pub fetch_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            image_ttl: Duration::from_secs(3600),
            fetch_timeout: Duration::from_secs(15),
        }
    }
}

/// Where a resolved URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// Transform cache hit.
    Cache,
    /// Asset already on the CDN.
    Cdn,
    /// This request performed the upload.
    Upload,
    /// This request waited on another request's upload.
    SharedUpload,
}

impl ResolutionSource {
    /// Returns a short label for logs and headers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Cdn => "cdn",
            Self::Upload => "upload",
            Self::SharedUpload => "shared-upload",
        }
    }
}

/// A servable URL for one requested image size.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Versioned delivery URL.
    pub url: VersionedUrl,
    /// How the URL was obtained.
    pub source: ResolutionSource,
}

/// Resolves image filenames to CDN URLs, uploading each base name at most once
/// at a time.
#[derive(Clone)]
pub struct ImageResolver {
    source: Arc<dyn MediaSourcePort>,
    store: Arc<dyn ImageStorePort>,
    cache: Arc<dyn UrlCachePort>,
    uploads: Arc<InFlightRegistry<Arc<VariantUrls>>>,
    config: ResolverConfig,
}

impl ImageResolver {
    /// Creates a resolver over the given adapters with an empty upload registry.
    #[must_use]
    pub fn new(
        source: Arc<dyn MediaSourcePort>,
        store: Arc<dyn ImageStorePort>,
        cache: Arc<dyn UrlCachePort>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            source,
            store,
            cache,
            uploads: Arc::new(InFlightRegistry::new()),
            config,
        }
    }

    /// Returns the number of uploads currently in progress.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.uploads.len()
    }

    /// Resolves `filename` to a versioned URL.
    ///
    /// `size` overrides any size suffix in the filename; unknown sizes select
    /// `medium`.
    ///
    /// # Errors
    /// Returns [`ResolveError`] if the filename is invalid, the image is absent
    /// upstream, or fetching or uploading fails. A failing CDN existence check
    /// is not an error.
    pub async fn resolve(
        &self,
        filename: &str,
        size: Option<&str>,
    ) -> Result<Resolution, ResolveError> {
        let id = ImageIdentifier::parse(filename)?.with_size_token(size);
        let key = id.cache_key(id.size());

        if let Some(url) = self.cache.lookup(&key) {
            debug!(image = %id, "Resolved from cache");
            return Ok(Resolution {
                url,
                source: ResolutionSource::Cache,
            });
        }

        match self.store.existing(id.base_name()).await {
            Ok(asset) => {
                let url = self
                    .store
                    .transform_url(&asset.public_id, id.size(), asset.version);
                self.cache.store(key, url.clone(), self.config.image_ttl);
                debug!(image = %id, version = %asset.version, "Resolved from CDN");
                return Ok(Resolution {
                    url,
                    source: ResolutionSource::Cdn,
                });
            }
            Err(e) if e.is_not_found() => {
                debug!(image = %id, "Image not on CDN yet");
            }
            Err(e) => {
                warn!(image = %id, error = %e, "CDN existence check failed, falling back to upload");
            }
        }

        let job = UploadJob {
            id: id.clone(),
            source: Arc::clone(&self.source),
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            config: self.config,
        };
        let flight = self.uploads.join_or_start(id.base_name(), || job.run());
        let source = if flight.leader {
            ResolutionSource::Upload
        } else {
            ResolutionSource::SharedUpload
        };

        let variants = flight.future.await?;
        Ok(Resolution {
            url: variants.get(id.size()).clone(),
            source,
        })
    }

    /// Drops every cached size of the image behind `filename`.
    ///
    /// # Errors
    /// Returns [`ResolveError::InvalidFilename`] if `filename` cannot be parsed.
    pub fn invalidate(&self, filename: &str) -> Result<usize, ResolveError> {
        let id = ImageIdentifier::parse(filename)?;
        let removed = self.cache.evict_prefix(&format!("image:{}:", id.base_name()));
        info!(base_name = id.base_name(), removed, "Invalidated cached image URLs");
        Ok(removed)
    }
}

/// The work a leading request hands to the upload task.
struct UploadJob {
    id: ImageIdentifier,
    source: Arc<dyn MediaSourcePort>,
    store: Arc<dyn ImageStorePort>,
    cache: Arc<dyn UrlCachePort>,
    config: ResolverConfig,
}

impl UploadJob {
    async fn run(self) -> Result<Arc<VariantUrls>, ResolveError> {
        let base_name = self.id.base_name();

        // A previous flight may have finished between our CDN check and registration.
        if let Some(variants) = self.cached_variants() {
            debug!(base_name, "Reusing URLs from a just-finished upload");
            return Ok(Arc::new(variants));
        }

        let record = self.fetch_original().await?;
        let asset = self
            .store
            .upload_original(&record)
            .await
            .map_err(ResolveError::Upload)?;

        let variants = self.store.variant_urls(&asset);
        for (size, url) in variants.iter() {
            self.cache.store(
                image_cache_key(base_name, size),
                url.clone(),
                self.config.image_ttl,
            );
        }

        info!(
            base_name,
            public_id = %asset.public_id,
            version = %asset.version,
            "Uploaded and cached image variants"
        );
        Ok(Arc::new(variants))
    }

    fn cached_variants(&self) -> Option<VariantUrls> {
        let base_name = self.id.base_name();
        let lookup = |size| self.cache.lookup(&image_cache_key(base_name, size));
        VariantUrls::from_parts(
            lookup(SizeVariant::Thumb)?,
            lookup(SizeVariant::Medium)?,
            lookup(SizeVariant::Large)?,
            lookup(SizeVariant::Original)?,
        )
    }

    async fn fetch_original(&self) -> Result<RawImageRecord, ResolveError> {
        let filename = self.id.upstream_filename();
        let selector = MediaSelector::by_filename(filename.clone())?;

        let records = tokio::time::timeout(
            self.config.fetch_timeout,
            self.source.fetch_media(&selector),
        )
        .await
        .map_err(|_| {
            warn!(filename = %filename, "Upstream fetch timed out");
            UpstreamError::Timeout {
                after_ms: u64::try_from(self.config.fetch_timeout.as_millis())
                    .unwrap_or(u64::MAX),
            }
        })??;

        let record = records
            .into_iter()
            .find(|r| r.matches_filename(&filename))
            .ok_or_else(|| ResolveError::image_not_found(&filename))?;

        record
            .into_raw_image(self.id.base_name())
            .ok_or_else(|| ResolveError::data_missing(filename))
    }
}
