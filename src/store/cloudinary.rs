//! Cloudinary-backed image store.
//!
//! Uploads use Cloudinary's signed upload API: the request carries the API key,
//! a unix timestamp and a SHA-1 signature over the signed parameters followed by
//! the API secret. The secret itself never leaves the process.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use tracing::debug;

use super::{require_absolute_url, ImageStore};
use crate::error::{ConfigError, UploadError};
use crate::upload::extension_for;

/// Default Cloudinary API base URL.
pub const DEFAULT_CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com";

/// Account credentials for Cloudinary.
#[derive(Clone, PartialEq, Eq)]
pub struct CloudinaryCredentials {
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl CloudinaryCredentials {
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// The cloud (account) name.
    pub fn cloud_name(&self) -> &str {
        &self.cloud_name
    }

    /// The public API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

// Keep the secret out of logs.
impl fmt::Debug for CloudinaryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudinaryCredentials")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Compute a Cloudinary request signature.
///
/// Parameters are sorted by name, joined as `name=value` pairs with `&`, the
/// API secret is appended and the result is hashed with SHA-1 (lowercase hex).
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Image store backed by Cloudinary's upload API.
#[derive(Clone)]
pub struct CloudinaryStore {
    client: Client,
    credentials: CloudinaryCredentials,
    api_base: String,
}

impl CloudinaryStore {
    /// Create a store for the given account.
    ///
    /// Fails if any credential is empty, so a misconfigured process never
    /// starts serving uploads.
    pub fn new(
        credentials: CloudinaryCredentials,
        api_base: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let checks = [
            ("Cloudinary cloud name", &credentials.cloud_name),
            ("Cloudinary API key", &credentials.api_key),
            ("Cloudinary API secret", &credentials.api_secret),
        ];
        for (name, value) in checks {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    name,
                    reason: "must not be empty".to_string(),
                });
            }
        }

        Ok(Self {
            client: Client::new(),
            credentials,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    /// The account this store uploads to.
    pub fn credentials(&self) -> &CloudinaryCredentials {
        &self.credentials
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/v1_1/{}/{}",
            self.api_base, self.credentials.cloud_name, action
        )
    }
}

/// Pull a readable message out of a Cloudinary error response.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait]
impl ImageStore for CloudinaryStore {
    async fn upload(
        &self,
        data: Bytes,
        content_type: &str,
        folder: &str,
    ) -> Result<String, UploadError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("folder", folder), ("timestamp", &timestamp)],
            &self.credentials.api_secret,
        );

        let size = data.len() as u64;
        let part = Part::stream_with_length(data, size)
            .file_name(format!("upload.{}", extension_for(content_type)))
            .mime_str(content_type)
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        let form = Form::new()
            .part("file", part)
            .text("api_key", self.credentials.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder.to_string())
            .text("signature", signature);

        let url = self.endpoint("image/upload");
        debug!(url = %url, size, "Uploading image to Cloudinary");

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let parsed: UploadResponse = serde_json::from_str(&body)
            .map_err(|e| UploadError::InvalidResponse(e.to_string()))?;

        let secure_url = parsed.secure_url.ok_or_else(|| {
            UploadError::InvalidResponse("response has no secure_url".to_string())
        })?;

        require_absolute_url(&secure_url)
    }

    async fn ping(&self) -> Result<(), UploadError> {
        let response = self
            .client
            .get(self.endpoint("ping"))
            .basic_auth(
                &self.credentials.api_key,
                Some(&self.credentials.api_secret),
            )
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(UploadError::Rejected {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }

    fn name(&self) -> &'static str {
        "cloudinary"
    }
}
