//! Image naming types: logical identifiers and size variants.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::errors::ResolveError;

/// Rendered size of an image.
///
/// Every variant of one base name is derived from the same uploaded asset;
/// only the delivery transformation differs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SizeVariant {
    /// Small listing thumbnail.
    Thumb,
    /// Default detail size.
    #[default]
    Medium,
    /// Gallery size.
    Large,
    /// Unresized original, quality optimised only.
    Original,
}

/// Target box and quality of a size variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    /// Target width in pixels, `None` keeps the original width.
    pub width: Option<u32>,
    /// Target height in pixels, `None` keeps the original height.
    pub height: Option<u32>,
    /// Whether the image is cropped to fill the box instead of fitted inside it.
    pub fill: bool,
    /// Fixed quality, `None` lets the CDN pick.
    pub quality: Option<u8>,
}

impl SizeVariant {
    /// All variants, smallest first.
    pub const ALL: [Self; 4] = [Self::Thumb, Self::Medium, Self::Large, Self::Original];

    /// Returns the lowercase name used in filenames, query strings and cache keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Thumb => "thumb",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Original => "original",
        }
    }

    /// Parses a recognised size token, case-insensitively.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|size| size.as_str().eq_ignore_ascii_case(token.trim()))
    }

    /// Parses a size token, falling back to [`SizeVariant::Medium`] for anything unknown.
    #[must_use]
    pub fn from_token_lenient(token: &str) -> Self {
        Self::from_token(token).unwrap_or_default()
    }

    /// Returns the fixed target dimensions of this variant.
    #[must_use]
    pub const fn dimensions(self) -> Dimensions {
        match self {
            Self::Thumb => Dimensions {
                width: Some(300),
                height: Some(200),
                fill: true,
                quality: Some(80),
            },
            Self::Medium => Dimensions {
                width: Some(800),
                height: Some(600),
                fill: false,
                quality: Some(85),
            },
            Self::Large => Dimensions {
                width: Some(1600),
                height: Some(1200),
                fill: false,
                quality: Some(90),
            },
            Self::Original => Dimensions {
                width: None,
                height: None,
                fill: false,
                quality: None,
            },
        }
    }
}

impl fmt::Display for SizeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A requested image, decomposed into its stable base name and the size asked for.
///
/// `property42_livingroom_thumb.jpg` becomes base name `property42_livingroom`,
/// extension `jpg`, size `thumb`. The base name is what the CDN and the upstream
/// lookups key on; the size suffix never reaches them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageIdentifier {
    base_name: String,
    extension: Option<String>,
    size: SizeVariant,
}

impl ImageIdentifier {
    /// Parses a filename such as `foo_large.jpg`.
    ///
    /// A filename without a recognised size suffix resolves to `medium`.
    ///
    /// # Errors
    /// Returns [`ResolveError::InvalidFilename`] for empty names, path separators,
    /// parent references, URL delimiters (`#`, `?`, `%`), control characters,
    /// or names that are only an extension.
    pub fn parse(filename: &str) -> Result<Self, ResolveError> {
        let filename = filename.trim();

        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
            || filename
                .chars()
                .any(|c| matches!(c, '#' | '?' | '%') || c.is_control())
        {
            return Err(ResolveError::invalid_filename(filename));
        }

        let (stem, extension) = match filename.rsplit_once('.') {
            Some((stem, ext))
                if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
            {
                (stem, Some(ext.to_string()))
            }
            _ => (filename, None),
        };

        let (base_name, size) = match stem.rsplit_once('_') {
            Some((base, suffix)) if !base.is_empty() => match SizeVariant::from_token(suffix) {
                Some(size) => (base, size),
                None => (stem, SizeVariant::default()),
            },
            _ => (stem, SizeVariant::default()),
        };

        if base_name.is_empty() {
            return Err(ResolveError::invalid_filename(filename));
        }

        Ok(Self {
            base_name: base_name.to_string(),
            extension,
            size,
        })
    }

    /// Returns a copy requesting a different size.
    #[must_use]
    pub fn with_size(mut self, size: SizeVariant) -> Self {
        self.size = size;
        self
    }

    /// Applies an explicit `?size=` token. Unknown tokens select `medium`.
    #[must_use]
    pub fn with_size_token(self, token: Option<&str>) -> Self {
        match token {
            Some(token) => self.with_size(SizeVariant::from_token_lenient(token)),
            None => self,
        }
    }

    /// Returns the suffix-free base name.
    #[must_use]
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Returns the file extension, if one was given.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// Returns the requested size.
    #[must_use]
    pub const fn size(&self) -> SizeVariant {
        self.size
    }

    /// Returns the filename the upstream stores this image under.
    #[must_use]
    pub fn upstream_filename(&self) -> String {
        match &self.extension {
            Some(ext) => format!("{}.{ext}", self.base_name),
            None => self.base_name.clone(),
        }
    }

    /// Returns the transform cache key for this image at `size`.
    #[must_use]
    pub fn cache_key(&self, size: SizeVariant) -> String {
        image_cache_key(&self.base_name, size)
    }
}

impl fmt::Display for ImageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.base_name, self.size)
    }
}

/// Builds the `image:{base}:{size}` cache key.
#[must_use]
pub fn image_cache_key(base_name: &str, size: SizeVariant) -> String {
    format!("image:{base_name}:{size}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("foo.jpg", "foo", SizeVariant::Medium ; "no_suffix")]
    #[test_case("foo_thumb.jpg", "foo", SizeVariant::Thumb ; "thumb_suffix")]
    #[test_case("foo_large.jpg", "foo", SizeVariant::Large ; "large_suffix")]
    #[test_case("foo_ORIGINAL.png", "foo", SizeVariant::Original ; "case_insensitive_suffix")]
    #[test_case("property42_livingroom.jpg", "property42_livingroom", SizeVariant::Medium ; "underscore_not_a_size")]
    #[test_case("property42_livingroom_thumb.jpg", "property42_livingroom", SizeVariant::Thumb ; "underscore_and_size")]
    #[test_case("foo_thumb", "foo", SizeVariant::Thumb ; "no_extension")]
    #[test_case("_thumb.jpg", "_thumb", SizeVariant::Medium ; "suffix_without_base")]
    fn test_parse(filename: &str, base: &str, size: SizeVariant) {
        let id = ImageIdentifier::parse(filename).unwrap();
        assert_eq!(id.base_name(), base);
        assert_eq!(id.size(), size);
    }

    #[test_case("" ; "empty")]
    #[test_case("   " ; "blank")]
    #[test_case("../secret.jpg" ; "parent_reference")]
    #[test_case("a/b.jpg" ; "path_separator")]
    #[test_case(".jpg" ; "extension_only")]
    #[test_case("foo#bar.jpg" ; "fragment_delimiter")]
    #[test_case("foo?x=1.jpg" ; "query_delimiter")]
    #[test_case("foo%23bar.jpg" ; "percent_escape")]
    #[test_case("foo\nbar.jpg" ; "control_character")]
    fn test_parse_rejects(filename: &str) {
        assert!(matches!(
            ImageIdentifier::parse(filename),
            Err(ResolveError::InvalidFilename { .. })
        ));
    }

    #[test]
    fn test_upstream_filename_drops_suffix() {
        let id = ImageIdentifier::parse("prop1_thumb.jpg").unwrap();
        assert_eq!(id.upstream_filename(), "prop1.jpg");
        assert_eq!(id.extension(), Some("jpg"));

        let bare = ImageIdentifier::parse("prop1_large").unwrap();
        assert_eq!(bare.upstream_filename(), "prop1");
    }

    #[test]
    fn test_size_token_overrides_suffix() {
        let id = ImageIdentifier::parse("foo_thumb.jpg")
            .unwrap()
            .with_size_token(Some("large"));
        assert_eq!(id.size(), SizeVariant::Large);
    }

    #[test]
    fn test_unknown_size_token_is_medium() {
        let id = ImageIdentifier::parse("foo_thumb.jpg")
            .unwrap()
            .with_size_token(Some("gigantic"));
        assert_eq!(id.size(), SizeVariant::Medium);
        assert_eq!(SizeVariant::from_token_lenient("xl"), SizeVariant::Medium);
    }

    #[test]
    fn test_cache_key_format() {
        let id = ImageIdentifier::parse("foo_thumb.jpg").unwrap();
        assert_eq!(id.cache_key(SizeVariant::Large), "image:foo:large");
    }

    #[test]
    fn test_thumb_dimensions() {
        let dims = SizeVariant::Thumb.dimensions();
        assert_eq!(dims.width, Some(300));
        assert_eq!(dims.height, Some(200));
        assert!(dims.fill);
    }
}
