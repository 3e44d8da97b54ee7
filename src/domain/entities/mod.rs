//! Domain entity definitions.

mod asset;
mod image;
mod media;
mod secret;

pub use asset::{AssetVersion, UploadedAsset, VariantUrls, VersionedUrl};
pub use image::{Dimensions, ImageIdentifier, SizeVariant, image_cache_key};
pub use media::{MediaRecord, MediaSelector, RawImageRecord};
pub use secret::Secret;
