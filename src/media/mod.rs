//! Client for the external media host. The subsystem only relies on an
//! upload-yields-a-URL-or-fails contract; the provider behind the endpoint
//! is opaque.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;
use url::Url;

#[cfg(test)]
use mockall::automock;

use crate::config::MediaConfig;
use crate::error::AppError;

/// A usable reference to an uploaded asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    pub url: String,
}

/// Uploads a locally staged file and returns its public reference.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MediaStorage: Send + Sync {
    async fn upload(&self, source: &str) -> Result<MediaAsset, AppError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: Option<String>,
}

/// HTTP implementation of [`MediaStorage`]. Every upload is bounded by the
/// configured timeout so a stalled media host cannot pin a request handler.
pub struct HttpMediaClient {
    client: reqwest::Client,
    upload_url: String,
    api_key: Option<String>,
}

impl HttpMediaClient {
    pub fn new(config: &MediaConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upload_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("media client init failed: {}", e)))?;

        Ok(Self {
            client,
            upload_url: config.upload_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl MediaStorage for HttpMediaClient {
    async fn upload(&self, source: &str) -> Result<MediaAsset, AppError> {
        let file_name = Path::new(source)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let bytes = tokio::fs::read(source)
            .await
            .map_err(|e| AppError::Upload(format!("media file unreadable: {}", e)))?;

        let mut request = self
            .client
            .post(&self.upload_url)
            .query(&[("filename", file_name.as_str())])
            .body(bytes);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Upload(format!("media upload failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upload(format!(
                "media host rejected upload with status {}",
                response.status()
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upload(format!("invalid media host response: {}", e)))?;

        let url = body
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| AppError::Upload("media host returned no usable reference".into()))?;

        Url::parse(&url)
            .map_err(|e| AppError::Upload(format!("media host returned an invalid URL: {}", e)))?;

        info!("uploaded {} to media host", file_name);
        Ok(MediaAsset { url })
    }
}
