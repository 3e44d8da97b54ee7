//! Domain layer with core entities, errors and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{ImageIdentifier, SizeVariant, VersionedUrl};
pub use errors::{CdnError, ResolveError, UpstreamError};
pub use ports::{ImageStorePort, MediaSourcePort, UrlCachePort};
