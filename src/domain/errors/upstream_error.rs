//! Upstream data source error types.

use thiserror::Error;

/// Normalised failure of a call to the upstream listing API.
///
/// Every variant exposes a stable [`code`](Self::code), a human message via
/// `Display`, and the upstream HTTP status when one was received.
#[derive(Debug, Clone, Error)]
#[allow(missing_docs)]
pub enum UpstreamError {
    #[error("upstream unreachable: {message}")]
    Network { message: String },

    #[error("upstream did not answer within {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("upstream failed with {status} after {attempts} attempts: {message}")]
    Server {
        status: u16,
        attempts: u32,
        message: String,
    },

    #[error("upstream rejected request with {status}: {message}")]
    Client { status: u16, message: String },

    #[error("upstream sent an unreadable response: {message}")]
    InvalidResponse { message: String },

    #[error("invalid media selector: {message}")]
    InvalidSelector { message: String },
}

impl UpstreamError {
    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
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

    /// Creates invalid selector error.
    #[must_use]
    pub fn invalid_selector(message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            message: message.into(),
        }
    }

    /// Returns the machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Network { .. } => "UPSTREAM_NETWORK",
            Self::Timeout { .. } => "UPSTREAM_TIMEOUT",
            Self::Server { .. } => "UPSTREAM_SERVER",
            Self::Client { .. } => "UPSTREAM_CLIENT",
            Self::InvalidResponse { .. } => "UPSTREAM_INVALID_RESPONSE",
            Self::InvalidSelector { .. } => "UPSTREAM_INVALID_SELECTOR",
        }
    }

    /// Returns the upstream HTTP status, if the upstream answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } | Self::Client { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns whether another attempt may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout { .. } | Self::Server { .. }
        )
    }
}
