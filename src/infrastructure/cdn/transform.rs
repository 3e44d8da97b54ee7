//! Cloudinary delivery transformations and request signing.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::domain::entities::SizeVariant;

/// Renders the transformation path segment for `size`.
///
/// `thumb` becomes `c_fill,w_300,h_200,q_80`; `original` only asks for automatic
/// quality and format.
#[must_use]
pub fn transformation(size: SizeVariant) -> String {
    let dims = size.dimensions();
    let mut params = Vec::with_capacity(4);

    if dims.width.is_some() || dims.height.is_some() {
        params.push(if dims.fill { "c_fill" } else { "c_limit" }.to_string());
    }
    if let Some(width) = dims.width {
        params.push(format!("w_{width}"));
    }
    if let Some(height) = dims.height {
        params.push(format!("h_{height}"));
    }
    match dims.quality {
        Some(quality) => params.push(format!("q_{quality}")),
        None => params.push("q_auto,f_auto".to_string()),
    }

    params.join(",")
}

/// Builds the stable public id of `base_name` inside `folder`.
#[must_use]
pub fn public_id_for(folder: &str, base_name: &str) -> String {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        base_name.to_string()
    } else {
        format!("{folder}/{base_name}")
    }
}

/// Signs API parameters: SHA-256 over `k=v` pairs sorted by key, joined with
/// `&`, with the API secret appended.
#[must_use]
pub fn sign(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
    let to_sign = params
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}
