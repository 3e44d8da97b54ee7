//! CDN asset descriptors and version-bound delivery URLs.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::SizeVariant;

/// Version token the CDN assigns on every upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetVersion(u64);

impl AssetVersion {
    /// Wraps a raw version number.
    #[must_use]
    pub const fn new(version: u64) -> Self {
        Self(version)
    }

    /// Returns the raw version number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AssetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Descriptor of an asset stored on the CDN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedAsset {
    /// Stable identifier on the CDN, including any folder prefix.
    pub public_id: String,
    /// Version of the stored bytes.
    pub version: AssetVersion,
    /// Pixel width of the stored original.
    #[serde(default)]
    pub width: u32,
    /// Pixel height of the stored original.
    #[serde(default)]
    pub height: u32,
    /// Stored format, e.g. `jpg`.
    #[serde(default)]
    pub format: String,
    /// Stored size in bytes.
    #[serde(default)]
    pub bytes: u64,
}

/// A delivery URL that always carries the asset version.
///
/// There is no way to build one from a bare string: the only constructor takes
/// the version token, so a cached URL can never point at an unversioned render.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionedUrl {
    url: String,
    version: AssetVersion,
}

impl VersionedUrl {
    /// Composes `{delivery_base}/{transformation}/v{version}/{public_id}`.
    ///
    /// An empty transformation is omitted from the path.
    #[must_use]
    pub fn compose(
        delivery_base: &str,
        transformation: &str,
        version: AssetVersion,
        public_id: &str,
    ) -> Self {
        let base = delivery_base.trim_end_matches('/');
        let public_id = public_id.trim_start_matches('/');
        let url = if transformation.is_empty() {
            format!("{base}/{version}/{public_id}")
        } else {
            format!("{base}/{transformation}/{version}/{public_id}")
        };
        Self { url, version }
    }

    /// Returns the URL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Returns the version embedded in the URL.
    #[must_use]
    pub const fn version(&self) -> AssetVersion {
        self.version
    }
}

impl fmt::Display for VersionedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// The four delivery URLs of one uploaded asset, all bound to the same version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantUrls {
    version: AssetVersion,
    thumb: VersionedUrl,
    medium: VersionedUrl,
    large: VersionedUrl,
    original: VersionedUrl,
}

impl VariantUrls {
    /// Builds the URL set for `asset` by running `url_for` once per size.
    pub fn build(
        asset: &UploadedAsset,
        mut url_for: impl FnMut(&UploadedAsset, SizeVariant) -> VersionedUrl,
    ) -> Self {
        Self {
            version: asset.version,
            thumb: url_for(asset, SizeVariant::Thumb),
            medium: url_for(asset, SizeVariant::Medium),
            large: url_for(asset, SizeVariant::Large),
            original: url_for(asset, SizeVariant::Original),
        }
    }

    /// Reassembles a set from four previously computed URLs.
    ///
    /// Returns `None` unless all four carry the same version.
    #[must_use]
    pub fn from_parts(
        thumb: VersionedUrl,
        medium: VersionedUrl,
        large: VersionedUrl,
        original: VersionedUrl,
    ) -> Option<Self> {
        let version = thumb.version();
        let consistent = [&medium, &large, &original]
            .iter()
            .all(|url| url.version() == version);
        consistent.then_some(Self {
            version,
            thumb,
            medium,
            large,
            original,
        })
    }

    /// Returns the URL for `size`.
    #[must_use]
    pub const fn get(&self, size: SizeVariant) -> &VersionedUrl {
        match size {
            SizeVariant::Thumb => &self.thumb,
            SizeVariant::Medium => &self.medium,
            SizeVariant::Large => &self.large,
            SizeVariant::Original => &self.original,
        }
    }

    /// Returns the asset version shared by all four URLs.
    #[must_use]
    pub const fn version(&self) -> AssetVersion {
        self.version
    }

    /// Iterates over `(size, url)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (SizeVariant, &VersionedUrl)> {
        SizeVariant::ALL.into_iter().map(|size| (size, self.get(size)))
    }
}
