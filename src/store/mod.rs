//! Image store gateway.
//!
//! Proof-of-payment images are never kept locally. They are handed to a remote
//! image host which returns the public URL recorded with the donation.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            DonationService              │
//! └────────────────────┬────────────────────┘
//!                      │ upload(bytes, type, folder) -> URL
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │           ImageStore Trait              │
//! └────────────────────┬────────────────────┘
//!                      │
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//! ┌─────────────────┐    ┌─────────────────────┐
//! │ CloudinaryStore │    │    S3ImageStore     │
//! │ (signed upload) │    │ (PutObject + URL)   │
//! └─────────────────┘    └─────────────────────┘
//! ```
//!
//! Uploads are a single round trip. Failures are returned to the caller as
//! [`UploadError`]; nothing is retried or cached.

mod cloudinary;
mod s3;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::UploadError;

pub use cloudinary::{
    sign_params, CloudinaryCredentials, CloudinaryStore, DEFAULT_CLOUDINARY_API_BASE,
};
pub use s3::{create_s3_client, S3ImageStore};

/// A remote host for uploaded images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Upload `data` into `folder` and return its public, absolute URL.
    ///
    /// # Arguments
    /// * `data` - Image bytes, already accepted by upload intake
    /// * `content_type` - Declared MIME type of the image
    /// * `folder` - Logical folder (e.g. "donation-proofs")
    async fn upload(
        &self,
        data: Bytes,
        content_type: &str,
        folder: &str,
    ) -> Result<String, UploadError>;

    /// Check that the host is reachable and accepts our credentials.
    async fn ping(&self) -> Result<(), UploadError>;

    /// Short backend name for logging.
    fn name(&self) -> &'static str;
}

/// Check that a URL returned by an image host is absolute.
pub(crate) fn require_absolute_url(raw: &str) -> Result<String, UploadError> {
    let url = url::Url::parse(raw)
        .map_err(|e| UploadError::InvalidResponse(format!("bad URL '{}': {}", raw, e)))?;

    if url.cannot_be_a_base() {
        return Err(UploadError::InvalidResponse(format!(
            "URL '{}' is not absolute",
            raw
        )));
    }

    Ok(raw.to_string())
}
