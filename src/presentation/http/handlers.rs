//! Route handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderName, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::ApiError;
use super::state::AppState;
use crate::application::MediaListing;
use crate::infrastructure::cache::CacheStats;

const IMAGE_SOURCE_HEADER: HeaderName = HeaderName::from_static("x-image-source");

#[derive(Debug, Deserialize)]
pub(super) struct ImageQuery {
    size: Option<String>,
}

pub(super) async fn get_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    Query(query): Query<ImageQuery>,
) -> Result<Response, ApiError> {
    let resolution = state
        .resolver
        .resolve(&filename, query.size.as_deref())
        .await?;

    debug!(
        filename = %filename,
        source = resolution.source.as_str(),
        url = %resolution.url,
        "Redirecting to image"
    );

    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, resolution.url.to_string()),
            (IMAGE_SOURCE_HEADER, resolution.source.as_str().to_string()),
        ],
    )
        .into_response())
}

#[derive(Debug, Serialize)]
pub(super) struct InvalidateResponse {
    success: bool,
    removed: usize,
}

pub(super) async fn invalidate_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<InvalidateResponse>, ApiError> {
    let removed = state.resolver.invalidate(&filename)?;
    Ok(Json(InvalidateResponse {
        success: true,
        removed,
    }))
}

#[derive(Debug, Serialize)]
pub(super) struct MediaResponse {
    success: bool,
    data: MediaListing,
}

pub(super) async fn property_media(
    State(state): State<AppState>,
    Path(property_ref): Path<String>,
) -> Result<Json<MediaResponse>, ApiError> {
    let data = state.media.execute(&property_ref).await?;
    Ok(Json(MediaResponse {
        success: true,
        data,
    }))
}

#[derive(Debug, Serialize)]
pub(super) struct CacheReport {
    images: CacheStats,
    responses: CacheStats,
}

#[derive(Debug, Serialize)]
pub(super) struct HealthResponse {
    status: &'static str,
    upstream: &'static str,
    cache: CacheReport,
    in_flight_uploads: usize,
    timestamp: String,
}

/// Reports `degraded` rather than failing when the upstream is down: cached
/// and already-uploaded images are still served.
pub(super) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let upstream_ok = match state.source.health_check().await {
        Ok(()) => true,
        Err(e) => {
            warn!(code = e.code(), error = %e, "Upstream health check failed");
            false
        }
    };

    Json(HealthResponse {
        status: if upstream_ok { "ok" } else { "degraded" },
        upstream: if upstream_ok { "reachable" } else { "unreachable" },
        cache: CacheReport {
            images: state.url_cache.stats(),
            responses: state.response_cache.stats(),
        },
        in_flight_uploads: state.resolver.in_flight(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
