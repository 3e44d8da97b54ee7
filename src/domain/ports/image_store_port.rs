//! CDN image store port definition.

use async_trait::async_trait;

use crate::domain::entities::{
    AssetVersion, RawImageRecord, SizeVariant, UploadedAsset, VariantUrls, VersionedUrl,
};
use crate::domain::errors::CdnError;

/// Port for the image CDN: one upload per logical image, sizes derived on read.
#[async_trait]
pub trait ImageStorePort: Send + Sync {
    /// Uploads the original bytes of `image` under its base name.
    async fn upload_original(&self, image: &RawImageRecord) -> Result<UploadedAsset, CdnError>;

    /// Looks up the stored asset for `base_name`.
    ///
    /// Must return [`CdnError::NotFound`] for a clean absence and reserve
    /// other variants for failures to find out.
    async fn existing(&self, base_name: &str) -> Result<UploadedAsset, CdnError>;

    /// Builds the delivery URL of `public_id` at `size`. Pure, no network.
    fn transform_url(&self, public_id: &str, size: SizeVariant, version: AssetVersion)
    -> VersionedUrl;

    /// Builds all four delivery URLs of `asset`.
    fn variant_urls(&self, asset: &UploadedAsset) -> VariantUrls {
        VariantUrls::build(asset, |asset, size| {
            self.transform_url(&asset.public_id, size, asset.version)
        })
    }
}
