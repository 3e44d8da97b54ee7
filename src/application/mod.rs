//! Application layer with services, use cases and DTOs.

/// Data transfer objects.
pub mod dto;
/// Image resolution services.
pub mod services;
/// Use case implementations.
pub mod use_cases;

pub use dto::{ImageLinks, PropertyImage};
pub use services::{ImageResolver, Resolution, ResolutionSource, ResolverConfig};
pub use use_cases::{ListPropertyMediaUseCase, MediaListing};
