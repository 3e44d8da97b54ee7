//! Domain error types.

mod cdn_error;
mod resolve_error;
mod upstream_error;

pub use cdn_error::CdnError;
pub use resolve_error::ResolveError;
pub use upstream_error::UpstreamError;
