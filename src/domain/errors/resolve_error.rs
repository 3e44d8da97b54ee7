//! Image resolution error types.

use thiserror::Error;

use super::{CdnError, UpstreamError};

/// Failure to turn an image filename into a servable URL.
///
/// `Clone` so that one failed upload can be reported to every request that
/// was waiting on it.
#[derive(Debug, Clone, Error)]
#[allow(missing_docs)]
pub enum ResolveError {
    #[error("invalid image filename: {filename:?}")]
    InvalidFilename { filename: String },

    #[error("image {filename} does not exist upstream")]
    UpstreamImageNotFound { filename: String },

    #[error("image {filename} exists upstream but has no data")]
    UpstreamDataMissing { filename: String },

    #[error("failed to fetch image from upstream: {0}")]
    UpstreamFetch(#[from] UpstreamError),

    #[error("failed to upload image: {0}")]
    Upload(CdnError),

    #[error("upload of {base_name} was interrupted: {message}")]
    Interrupted { base_name: String, message: String },
}

impl ResolveError {
    /// Creates invalid filename error.
    #[must_use]
    pub fn invalid_filename(filename: impl Into<String>) -> Self {
        Self::InvalidFilename {
            filename: filename.into(),
        }
    }

    /// Creates upstream not found error.
    #[must_use]
    pub fn image_not_found(filename: impl Into<String>) -> Self {
        Self::UpstreamImageNotFound {
            filename: filename.into(),
        }
    }

    /// Creates upstream data missing error.
    #[must_use]
    pub fn data_missing(filename: impl Into<String>) -> Self {
        Self::UpstreamDataMissing {
            filename: filename.into(),
        }
    }

    /// Returns whether the image is known not to exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UpstreamImageNotFound { .. } | Self::UpstreamDataMissing { .. }
        )
    }
}
