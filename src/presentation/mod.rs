//! Presentation layer with the inbound HTTP surface.

/// HTTP routes, handlers and error envelope.
pub mod http;

pub use http::{ApiError, AppState, router, serve};
