//! Upstream media records.

use bytes::Bytes;

use crate::domain::errors::UpstreamError;

/// Which media records to ask the upstream for.
///
/// At least one of the two fields is always set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaSelector {
    filename: Option<String>,
    property_ref: Option<String>,
}

impl MediaSelector {
    /// Creates a selector from optional parts.
    ///
    /// # Errors
    /// Returns [`UpstreamError::InvalidSelector`] when both parts are missing or blank.
    pub fn new(
        filename: Option<String>,
        property_ref: Option<String>,
    ) -> Result<Self, UpstreamError> {
        let filename = filename.filter(|f| !f.trim().is_empty());
        let property_ref = property_ref.filter(|p| !p.trim().is_empty());

        if filename.is_none() && property_ref.is_none() {
            return Err(UpstreamError::invalid_selector(
                "a filename or a property reference is required",
            ));
        }

        Ok(Self {
            filename,
            property_ref,
        })
    }

    /// Selects the media record stored under `filename`.
    ///
    /// # Errors
    /// Returns [`UpstreamError::InvalidSelector`] when `filename` is blank.
    pub fn by_filename(filename: impl Into<String>) -> Result<Self, UpstreamError> {
        Self::new(Some(filename.into()), None)
    }

    /// Selects every media record of a property.
    ///
    /// # Errors
    /// Returns [`UpstreamError::InvalidSelector`] when `property_ref` is blank.
    pub fn by_property(property_ref: impl Into<String>) -> Result<Self, UpstreamError> {
        Self::new(None, Some(property_ref.into()))
    }

    /// Returns the filename part.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Returns the property reference part.
    #[must_use]
    pub fn property_ref(&self) -> Option<&str> {
        self.property_ref.as_deref()
    }
}

/// One media element returned by the upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRecord {
    /// Filename the upstream stores the media under.
    pub filename: String,
    /// Free-text caption.
    pub caption: String,
    /// Position within the property's gallery.
    pub sort_order: u32,
    /// Owning property, when the upstream reports it.
    pub property_ref: Option<String>,
    /// Decoded image bytes, absent when the upstream sent no payload.
    pub payload: Option<Bytes>,
}

impl MediaRecord {
    /// Returns true if this record is stored under `filename`, ignoring ASCII case.
    #[must_use]
    pub fn matches_filename(&self, filename: &str) -> bool {
        self.filename.eq_ignore_ascii_case(filename)
    }

    /// Converts into raw upload input for `base_name`.
    ///
    /// Returns `None` if the record carries no bytes.
    #[must_use]
    pub fn into_raw_image(self, base_name: &str) -> Option<RawImageRecord> {
        let bytes = self.payload.filter(|b| !b.is_empty())?;
        Some(RawImageRecord {
            base_name: base_name.to_string(),
            filename: self.filename,
            bytes,
            property_ref: self.property_ref,
        })
    }
}

/// Image bytes on their way to the CDN. Lives only for the duration of one upload.
#[derive(Debug, Clone)]
pub struct RawImageRecord {
    /// Base name the asset is uploaded under.
    pub base_name: String,
    /// Upstream filename the bytes came from.
    pub filename: String,
    /// Encoded image bytes.
    pub bytes: Bytes,
    /// Owning property, when known.
    pub property_ref: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(payload: Option<&'static [u8]>) -> MediaRecord {
        MediaRecord {
            filename: "Prop1.JPG".to_string(),
            caption: "Front".to_string(),
            sort_order: 1,
            property_ref: Some("P1".to_string()),
            payload: payload.map(Bytes::from_static),
        }
    }

    #[test]
    fn test_selector_requires_a_field() {
        assert!(matches!(
            MediaSelector::new(None, Some("  ".to_string())),
            Err(UpstreamError::InvalidSelector { .. })
        ));
        assert!(MediaSelector::by_property("P1").is_ok());
        assert!(MediaSelector::by_filename("").is_err());
    }

    #[test]
    fn test_matches_filename_ignores_case() {
        assert!(record(None).matches_filename("prop1.jpg"));
        assert!(!record(None).matches_filename("prop2.jpg"));
    }

    #[test]
    fn test_into_raw_image_requires_bytes() {
        assert!(record(None).into_raw_image("prop1").is_none());
        assert!(record(Some(b"")).into_raw_image("prop1").is_none());

        let raw = record(Some(b"\xff\xd8\xff")).into_raw_image("prop1").unwrap();
        assert_eq!(raw.base_name, "prop1");
        assert_eq!(raw.property_ref.as_deref(), Some("P1"));
        assert_eq!(raw.bytes.len(), 3);
    }
}
