//! JSON error envelope and status mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error};

use crate::domain::errors::{ResolveError, UpstreamError};

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    success: bool,
    message: String,
    details: Option<String>,
    timestamp: String,
}

/// An error on its way to the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    details: Option<String>,
}

impl ApiError {
    /// Creates an error with a client-facing message.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    /// Attaches details.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Returns the HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

fn upstream_status(e: &UpstreamError) -> StatusCode {
    match e {
        UpstreamError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        UpstreamError::InvalidSelector { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl From<ResolveError> for ApiError {
    fn from(e: ResolveError) -> Self {
        let (status, message) = match &e {
            ResolveError::InvalidFilename { .. } => {
                (StatusCode::BAD_REQUEST, "Invalid image filename")
            }
            ResolveError::UpstreamImageNotFound { .. } | ResolveError::UpstreamDataMissing { .. } => {
                (StatusCode::NOT_FOUND, "Image not found")
            }
            ResolveError::UpstreamFetch(inner) => {
                (upstream_status(inner), "Failed to fetch image from upstream")
            }
            ResolveError::Upload(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to upload image"),
            ResolveError::Interrupted { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Image processing was interrupted")
            }
        };
        Self::new(status, message).with_details(e.to_string())
    }
}

impl From<UpstreamError> for ApiError {
    fn from(e: UpstreamError) -> Self {
        let message = match e {
            UpstreamError::InvalidSelector { .. } => "Invalid property reference",
            _ => "Failed to fetch data from upstream",
        };
        Self::new(upstream_status(&e), message).with_details(format!("{}: {e}", e.code()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, message = %self.message, details = ?self.details, "Request failed");
        } else {
            debug!(status = %self.status, message = %self.message, "Request rejected");
        }

        let envelope = ErrorEnvelope {
            success: false,
            message: self.message,
            details: self.details,
            timestamp: Utc::now().to_rfc3339(),
        };
        (self.status, Json(envelope)).into_response()
    }
}
