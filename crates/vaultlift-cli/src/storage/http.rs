//! Object store uploader over HTTP PUT
//!
//! Works with any store that accepts `PUT {endpoint}/{key}` with the raw
//! body, which covers S3-compatible buckets behind pre-authorized
//! endpoints, WebDAV shares and simple upload services.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use vaultlift_core::{RemoteLocation, StorageKey, UploadError, Uploader};

/// Longest response body quoted in a status error
const MAX_ERROR_BODY: usize = 200;

/// Uploads images with `PUT {endpoint}/{key}`
#[derive(Debug, Clone)]
pub struct HttpUploader {
    client: reqwest::Client,
    endpoint: String,
    public_base_url: String,
    bearer_token: Option<String>,
}

impl HttpUploader {
    /// Create an uploader
    ///
    /// `request_timeout` bounds a single request; the coordinator's deadline
    /// bounds the whole document independently.
    pub fn new(
        endpoint: &str,
        public_base_url: Option<&str>,
        bearer_token: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let endpoint = endpoint.trim_end_matches('/').to_string();
        Ok(Self {
            client,
            public_base_url: public_base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| endpoint.clone()),
            endpoint,
            bearer_token,
        })
    }

    /// URL an object is uploaded to
    pub fn upload_url(&self, key: &StorageKey) -> String {
        format!("{}/{}", self.endpoint, key.url_path())
    }
}

/// Content type sent for an image file
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

fn classify_request_error(err: reqwest::Error) -> UploadError {
    if err.is_timeout() {
        UploadError::transport(format!("request timed out: {err}"))
    } else {
        UploadError::transport(err.to_string())
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn upload(
        &self,
        local_path: &Path,
        key: &StorageKey,
    ) -> Result<RemoteLocation, UploadError> {
        let body = tokio::fs::read(local_path).await?;
        let url = self.upload_url(key);
        debug!("PUT {} ({} bytes)", url, body.len());

        let mut request = self
            .client
            .put(&url)
            .header(CONTENT_TYPE, content_type_for(local_path))
            .body(body);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(classify_request_error)?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(UploadError::permission_denied(format!(
                "{} rejected {} with {}",
                self.endpoint, key, status
            )));
        }
        if !status.is_success() {
            let mut message = response.text().await.unwrap_or_default();
            if message.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !message.is_char_boundary(cut) {
                    cut -= 1;
                }
                message.truncate(cut);
            }
            return Err(UploadError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(RemoteLocation::from_base_url(&self.public_base_url, key))
    }
}
