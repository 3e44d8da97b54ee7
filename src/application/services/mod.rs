pub mod image_resolver;
pub mod inflight;

pub use image_resolver::{ImageResolver, Resolution, ResolutionSource, ResolverConfig};
pub use inflight::{Flight, InFlightRegistry};
