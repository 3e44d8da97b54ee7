//! Use case implementations.

mod list_property_media_use_case;

pub use list_property_media_use_case::{ListPropertyMediaUseCase, MediaListing};
