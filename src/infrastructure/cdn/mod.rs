//! Image CDN adapter.
//!
//! This module provides:
//! - Signed uploads and existence lookups against the Cloudinary API
//! - Pure, versioned delivery URL generation per size variant

pub mod cloudinary;
pub mod transform;

pub use cloudinary::CloudinaryStore;
pub use transform::{public_id_for, sign, transformation};
