//! Inbound HTTP surface.

mod error;
mod handlers;
mod state;

use std::future::Future;

use axum::Router;
use axum::routing::{delete, get};
use tokio::net::TcpListener;
use tracing::info;

pub use error::ApiError;
pub use state::AppState;

/// Builds the gateway router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/images/:filename", get(handlers::get_image))
        .route("/images/:filename/cache", delete(handlers::invalidate_image))
        .route("/properties/:propref/media", get(handlers::property_media))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Serves `router` on `listener` until `shutdown` resolves.
///
/// # Errors
/// Returns an I/O error if the server fails.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Listening");
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use reqwest::StatusCode;
    use reqwest::redirect::Policy;

    use crate::application::{ImageResolver, ListPropertyMediaUseCase, ResolverConfig};
    use crate::domain::entities::VersionedUrl;
    use crate::domain::errors::UpstreamError;
    use crate::domain::ports::mocks::{MockImageStore, MockMediaSource};
    use crate::infrastructure::cache::TtlCache;

    const JPEG: &[u8] = b"\xff\xd8\xff\xe0";

    struct TestServer {
        base: String,
        client: reqwest::Client,
        source: Arc<MockMediaSource>,
        store: Arc<MockImageStore>,
    }

    async fn spawn_server() -> TestServer {
        let source = Arc::new(
            MockMediaSource::new()
                .with_image("prop1.jpg", "P1", JPEG)
                .with_image("prop1_kitchen.jpg", "P1", JPEG)
                .with_empty_record("broken.jpg"),
        );
        let store = Arc::new(MockImageStore::new());
        let url_cache: Arc<TtlCache<VersionedUrl>> = Arc::new(TtlCache::new(100));
        let response_cache = Arc::new(TtlCache::new(100));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let state = AppState {
            resolver: ImageResolver::new(
                source.clone(),
                store.clone(),
                url_cache.clone(),
                ResolverConfig::default(),
            ),
            media: ListPropertyMediaUseCase::new(
                source.clone(),
                response_cache.clone(),
                Duration::from_secs(300),
                base.clone(),
            ),
            source: source.clone(),
            url_cache,
            response_cache,
        };

        tokio::spawn(serve(listener, router(state), std::future::pending()));

        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()
            .unwrap();
        TestServer {
            base,
            client,
            source,
            store,
        }
    }

    #[tokio::test]
    async fn test_image_redirects_to_versioned_url() {
        let server = spawn_server().await;

        let response = server
            .client
            .get(format!("{}/images/prop1_thumb.jpg", server.base))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response.headers()["location"].to_str().unwrap();
        assert!(location.contains("c_fill,w_300,h_200"));
        assert!(location.contains("/v1700000000/rentman/prop1"));
        assert_eq!(response.headers()["x-image-source"], "upload");
    }

    #[tokio::test]
    async fn test_size_query_parameter() {
        let server = spawn_server().await;

        let response = server
            .client
            .get(format!("{}/images/prop1.jpg?size=original", server.base))
            .send()
            .await
            .unwrap();

        let location = response.headers()["location"].to_str().unwrap();
        assert!(location.contains("/q_auto,f_auto/"));
    }

    #[tokio::test]
    async fn test_missing_image_envelope() {
        let server = spawn_server().await;

        let response = server
            .client
            .get(format!("{}/images/ghost.jpg", server.base))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Image not found");
        assert!(body["details"].as_str().unwrap().contains("ghost.jpg"));
        assert!(chrono::DateTime::parse_from_rfc3339(body["timestamp"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_escaped_delimiters_are_rejected() {
        let server = spawn_server().await;

        for filename in ["prop1%23x.jpg", "prop1%3Fx=1.jpg", "prop1%2525.jpg"] {
            let response = server
                .client
                .get(format!("{}/images/{filename}", server.base))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{filename}");
        }
        assert_eq!(server.store.lookups(), 0);
        assert_eq!(server.store.uploads(), 0);
    }

    #[tokio::test]
    async fn test_empty_payload_is_not_found() {
        let server = spawn_server().await;

        let response = server
            .client
            .get(format!("{}/images/broken.jpg", server.base))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_failure_is_server_error() {
        let server = spawn_server().await;
        server.store.set_upload_rejected(true);

        let response = server
            .client
            .get(format!("{}/images/prop1.jpg", server.base))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_bad_gateway() {
        let server = spawn_server().await;
        server.source.fail_with(Some(UpstreamError::network("connection reset")));

        let response = server
            .client
            .get(format!("{}/images/prop1.jpg", server.base))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_invalidate_cached_image() {
        let server = spawn_server().await;
        server
            .client
            .get(format!("{}/images/prop1.jpg", server.base))
            .send()
            .await
            .unwrap();

        let response = server
            .client
            .delete(format!("{}/images/prop1.jpg/cache", server.base))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["removed"], 4);
    }

    #[tokio::test]
    async fn test_property_media_listing() {
        let server = spawn_server().await;

        let response = server
            .client
            .get(format!("{}/properties/P1/media", server.base))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = response.json().await.unwrap();
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["filename"], "prop1.jpg");
        assert_eq!(
            data[0]["images"]["thumb"],
            format!("{}/images/prop1.jpg?size=thumb", server.base)
        );
        assert_eq!(server.store.uploads(), 0);
    }

    #[tokio::test]
    async fn test_health_reports_degraded_upstream() {
        let server = spawn_server().await;

        let healthy: serde_json::Value = server
            .client
            .get(format!("{}/health", server.base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(healthy["status"], "ok");
        assert_eq!(healthy["in_flight_uploads"], 0);
        assert_eq!(healthy["cache"]["images"]["capacity"], 100);

        server
            .source
            .fail_with(Some(UpstreamError::network("connection refused")));
        let degraded: serde_json::Value = server
            .client
            .get(format!("{}/health", server.base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(degraded["status"], "degraded");
        assert_eq!(degraded["upstream"], "unreachable");
    }
}
