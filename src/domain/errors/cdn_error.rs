//! CDN image store error types.

use thiserror::Error;

/// Failure of a CDN operation.
#[derive(Debug, Clone, Error)]
#[allow(missing_docs)]
pub enum CdnError {
    /// The CDN positively reported that no such asset exists.
    #[error("asset not found on CDN: {public_id}")]
    NotFound { public_id: String },

    /// The CDN could not be asked, or answered ambiguously.
    #[error("CDN temporarily unavailable: {message}")]
    Transient { message: String },

    #[error("CDN rejected upload with {status}: {message}")]
    UploadRejected { status: u16, message: String },

    #[error("CDN response could not be read: {message}")]
    InvalidResponse { message: String },
}

impl CdnError {
    /// Creates not found error.
    #[must_use]
    pub fn not_found(public_id: impl Into<String>) -> Self {
        Self::NotFound {
            public_id: public_id.into(),
        }
    }

    /// Creates transient error.
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    /// Creates invalid response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Returns whether this is a clean absence signal.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
