//! S3-backed image store.
//!
//! Objects are written with `PutObject` under `{folder}/{uuid}.{ext}` and
//! addressed through a public base URL (a CDN, a public bucket website, or the
//! MinIO console address), since the bucket itself is not assumed to be public.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::debug;
use uuid::Uuid;

use super::{require_absolute_url, ImageStore};
use crate::error::UploadError;
use crate::upload::extension_for;

/// Image store writing into an S3 bucket.
#[derive(Clone)]
pub struct S3ImageStore {
    client: Client,
    bucket: String,
    public_url: String,
}

impl S3ImageStore {
    /// Create a new S3ImageStore for the given bucket.
    ///
    /// # Arguments
    /// * `client` - AWS S3 client to use for requests
    /// * `bucket` - Bucket receiving uploads
    /// * `public_url` - Base URL objects are publicly served from
    pub fn new(client: Client, bucket: impl Into<String>, public_url: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Get the bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Public URL for an object key.
    pub fn public_url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }
}

/// Object key for a new upload.
fn object_key(folder: &str, content_type: &str) -> String {
    format!(
        "{}/{}.{}",
        folder.trim_matches('/'),
        Uuid::new_v4(),
        extension_for(content_type)
    )
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn upload(
        &self,
        data: Bytes,
        content_type: &str,
        folder: &str,
    ) -> Result<String, UploadError> {
        let key = object_key(folder, content_type);
        debug!(bucket = %self.bucket, key = %key, size = data.len(), "Uploading image to S3");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                let status = e.raw_response().map(|r| r.status().as_u16());
                match status {
                    Some(status) if status >= 400 => UploadError::Rejected {
                        status,
                        message: e.to_string(),
                    },
                    _ => UploadError::Transport(e.to_string()),
                }
            })?;

        require_absolute_url(&self.public_url_for(&key))
    }

    async fn ping(&self) -> Result<(), UploadError> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| UploadError::Transport(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "s3"
    }
}

/// Create an S3 client with optional custom endpoint and region.
///
/// Use a custom endpoint for S3-compatible services like MinIO:
/// ```ignore
/// let client = create_s3_client(Some("http://localhost:9000"), "us-east-1").await;
/// ```
///
/// For AWS S3, pass `None` to use the default endpoint:
/// ```ignore
/// let client = create_s3_client(None, "us-east-1").await;
/// ```
pub async fn create_s3_client(endpoint_url: Option<&str>, region: &str) -> Client {
    let region = aws_config::Region::new(region.to_string());
    let mut config_loader =
        aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

    if let Some(endpoint) = endpoint_url {
        config_loader = config_loader.endpoint_url(endpoint);
    }

    let sdk_config = config_loader.load().await;

    // S3-compatible services usually need path-style addressing
    let s3_config = if endpoint_url.is_some() {
        aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build()
    } else {
        aws_sdk_s3::config::Builder::from(&sdk_config).build()
    };

    Client::from_conf(s3_config)
}
