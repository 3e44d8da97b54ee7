//! Property media DTOs.

use serde::Serialize;

use crate::domain::entities::{ImageIdentifier, MediaRecord, SizeVariant};

/// Gateway links to the four sizes of one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageLinks {
    /// Thumbnail link.
    pub thumb: String,
    /// Medium link.
    pub medium: String,
    /// Large link.
    pub large: String,
    /// Original link.
    pub original: String,
}

impl ImageLinks {
    /// Builds links for `filename` against the gateway mounted at `base_url`.
    ///
    /// Links target the image route rather than the CDN, so listing media
    /// never triggers an upload.
    #[must_use]
    pub fn for_image(base_url: &str, id: &ImageIdentifier) -> Self {
        let filename = id.upstream_filename();
        let base_url = base_url.trim_end_matches('/');
        let link = |size: SizeVariant| format!("{base_url}/images/{filename}?size={size}");
        Self {
            thumb: link(SizeVariant::Thumb),
            medium: link(SizeVariant::Medium),
            large: link(SizeVariant::Large),
            original: link(SizeVariant::Original),
        }
    }
}

/// One image of a property, as listed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyImage {
    /// Upstream filename.
    pub filename: String,
    /// Caption, empty when the upstream has none.
    pub caption: String,
    /// Display position.
    pub order: u32,
    /// Links per size.
    pub images: ImageLinks,
}

impl PropertyImage {
    /// Converts an upstream record. Returns `None` if its filename is unusable.
    #[must_use]
    pub fn from_record(base_url: &str, record: &MediaRecord) -> Option<Self> {
        let id = ImageIdentifier::parse(&record.filename).ok()?;
        Some(Self {
            filename: record.filename.clone(),
            caption: record.caption.clone(),
            order: record.sort_order,
            images: ImageLinks::for_image(base_url, &id),
        })
    }
}
