//! Cloudinary image store adapter.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url, multipart};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::transform::{public_id_for, sign, transformation};
use crate::domain::entities::{AssetVersion, RawImageRecord, Secret, SizeVariant, UploadedAsset, VersionedUrl};
use crate::domain::errors::CdnError;
use crate::domain::ports::ImageStorePort;
use crate::infrastructure::config::CdnConfig;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Cloudinary-backed [`ImageStorePort`].
///
/// Uploads the original once per base name; sizes are applied as delivery
/// transformations, so one upload serves all four variants.
pub struct CloudinaryStore {
    client: Client,
    cloud_name: String,
    api_key: String,
    api_secret: Secret,
    folder: String,
    api_base: Url,
    delivery_base: String,
}

impl std::fmt::Debug for CloudinaryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryStore")
            .field("cloud_name", &self.cloud_name)
            .field("folder", &self.folder)
            .field("api_base", &self.api_base.as_str())
            .finish_non_exhaustive()
    }
}

impl CloudinaryStore {
    /// Creates a store from configuration.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails or the API base URL is invalid.
    pub fn new(config: &CdnConfig) -> Result<Self, CdnError> {
        let api_base = Url::parse(&config.api_base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                CdnError::transient(format!("invalid API base URL: {}", config.api_base_url))
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CdnError::transient(format!("failed to create HTTP client: {e}")))?;

        let delivery_base = format!(
            "{}/{}/image/upload",
            config.delivery_base_url.trim_end_matches('/'),
            config.cloud_name
        );

        Ok(Self {
            client,
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            folder: config.folder.clone(),
            api_base,
            delivery_base,
        })
    }

    fn public_id(&self, base_name: &str) -> String {
        public_id_for(&self.folder, base_name)
    }

    /// Appends `/v1_1/{cloud}/...` to the API base, percent-encoding every segment.
    fn endpoint<'s>(&self, segments: impl IntoIterator<Item = &'s str>) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["v1_1", self.cloud_name.as_str()])
                .extend(segments);
        }
        url
    }

    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.json::<ErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => format!("HTTP {status}"),
        }
    }

    fn map_send_error(e: &reqwest::Error) -> CdnError {
        if e.is_timeout() {
            CdnError::transient("request timed out")
        } else if e.is_connect() {
            CdnError::transient("failed to connect to CDN")
        } else {
            CdnError::transient(e.to_string())
        }
    }
}

#[async_trait]
impl ImageStorePort for CloudinaryStore {
    async fn upload_original(&self, image: &RawImageRecord) -> Result<UploadedAsset, CdnError> {
        let public_id = self.public_id(&image.base_name);
        let url = self.endpoint(["image", "upload"]);

        let mut params = BTreeMap::new();
        params.insert("invalidate", "true".to_string());
        params.insert("overwrite", "true".to_string());
        params.insert("public_id", public_id.clone());
        params.insert("timestamp", chrono::Utc::now().timestamp().to_string());
        let signature = sign(&params, self.api_secret.expose());

        let file = multipart::Part::bytes(image.bytes.to_vec()).file_name(image.filename.clone());
        let mut form = multipart::Form::new()
            .part("file", file)
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        debug!(public_id = %public_id, bytes = image.bytes.len(), "POST image/upload");

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!(public_id = %public_id, error = %e, "Upload request failed");
                Self::map_send_error(&e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = Self::error_message(response).await;
            warn!(public_id = %public_id, status = %status, message = %message, "Upload rejected");
            return Err(CdnError::UploadRejected {
                status: status.as_u16(),
                message,
            });
        }

        let asset: UploadedAsset = response.json().await.map_err(|e| {
            warn!(error = %e, "Failed to parse upload response");
            CdnError::invalid_response(format!("failed to parse upload response: {e}"))
        })?;

        info!(
            public_id = %asset.public_id,
            version = %asset.version,
            width = asset.width,
            height = asset.height,
            bytes = asset.bytes,
            "Uploaded image to CDN"
        );

        Ok(asset)
    }

    async fn existing(&self, base_name: &str) -> Result<UploadedAsset, CdnError> {
        let public_id = self.public_id(base_name);
        let url = self.endpoint(
            ["resources", "image", "upload"]
                .into_iter()
                .chain(public_id.split('/')),
        );

        debug!(public_id = %public_id, "GET resources/image/upload");

        let response = self
            .client
            .get(url)
            .basic_auth(&self.api_key, Some(self.api_secret.expose()))
            .send()
            .await
            .map_err(|e| Self::map_send_error(&e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(CdnError::not_found(public_id)),
            status if status.is_success() => response.json().await.map_err(|e| {
                CdnError::invalid_response(format!("failed to parse resource response: {e}"))
            }),
            status => {
                let message = Self::error_message(response).await;
                Err(CdnError::transient(format!(
                    "existence check returned {status}: {message}"
                )))
            }
        }
    }

    fn transform_url(
        &self,
        public_id: &str,
        size: SizeVariant,
        version: AssetVersion,
    ) -> VersionedUrl {
        VersionedUrl::compose(&self.delivery_base, &transformation(size), version, public_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(api_base: &str) -> CdnConfig {
        CdnConfig {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: Secret::new("shh-this-is-secret"),
            folder: "rentman".to_string(),
            api_base_url: api_base.to_string(),
            delivery_base_url: "https://res.cloudinary.com".to_string(),
            timeout_secs: 5,
        }
    }

    fn asset_json() -> serde_json::Value {
        serde_json::json!({
            "public_id": "rentman/prop1",
            "version": 1_712_000_000_u64,
            "width": 1200,
            "height": 800,
            "format": "jpg",
            "bytes": 34567,
            "resource_type": "image"
        })
    }

    fn record() -> RawImageRecord {
        RawImageRecord {
            base_name: "prop1".to_string(),
            filename: "prop1.jpg".to_string(),
            bytes: Bytes::from_static(b"\xff\xd8\xff\xe0"),
            property_ref: Some("P1".to_string()),
        }
    }

    #[test]
    fn test_transform_url_is_versioned() {
        let store = CloudinaryStore::new(&config("http://unused")).unwrap();
        let url = store.transform_url("rentman/prop1", SizeVariant::Thumb, AssetVersion::new(9));
        assert_eq!(
            url.as_str(),
            "https://res.cloudinary.com/demo/image/upload/c_fill,w_300,h_200,q_80/v9/rentman/prop1"
        );
    }

    #[tokio::test]
    async fn test_existing_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1_1/demo/resources/image/upload/rentman/prop1"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = CloudinaryStore::new(&config(&server.uri())).unwrap();
        let result = store.existing("prop1").await;
        assert!(matches!(result, Err(CdnError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_existing_server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let store = CloudinaryStore::new(&config(&server.uri())).unwrap();
        let result = store.existing("prop1").await;
        assert!(matches!(result, Err(CdnError::Transient { .. })));
    }

    #[tokio::test]
    async fn test_existing_escapes_public_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1_1/demo/resources/image/upload/rentman/foo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(asset_json()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1_1/demo/resources/image/upload/rentman/foo%20bar"))
            .respond_with(ResponseTemplate::new(200).set_body_json(asset_json()))
            .expect(1)
            .mount(&server)
            .await;

        let store = CloudinaryStore::new(&config(&server.uri())).unwrap();
        for name in ["foo#bar", "foo?x=1"] {
            let result = store.existing(name).await;
            assert!(
                matches!(result, Err(CdnError::NotFound { .. })),
                "{name} resolved to another asset: {result:?}"
            );
        }
        assert!(store.existing("foo bar").await.is_ok());
    }

    #[test]
    fn test_rejects_invalid_api_base() {
        assert!(CloudinaryStore::new(&config("not a url")).is_err());
    }

    #[tokio::test]
    async fn test_existing_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1_1/demo/resources/image/upload/rentman/prop1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(asset_json()))
            .mount(&server)
            .await;

        let store = CloudinaryStore::new(&config(&server.uri())).unwrap();
        let asset = store.existing("prop1").await.unwrap();
        assert_eq!(asset.version, AssetVersion::new(1_712_000_000));
        assert_eq!(asset.width, 1200);
    }

    #[tokio::test]
    async fn test_upload_signed_and_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1_1/demo/image/upload"))
            .and(body_string_contains("rentman/prop1"))
            .and(body_string_contains("signature_algorithm"))
            .respond_with(ResponseTemplate::new(200).set_body_json(asset_json()))
            .expect(1)
            .mount(&server)
            .await;

        let store = CloudinaryStore::new(&config(&server.uri())).unwrap();
        let asset = store.upload_original(&record()).await.unwrap();
        assert_eq!(asset.public_id, "rentman/prop1");
        assert_eq!(asset.bytes, 34567);
    }

    #[tokio::test]
    async fn test_upload_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": { "message": "Invalid image file" }
            })))
            .mount(&server)
            .await;

        let store = CloudinaryStore::new(&config(&server.uri())).unwrap();
        match store.upload_original(&record()).await {
            Err(CdnError::UploadRejected { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid image file");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
