//! Test utilities for integration tests.
//!
//! This module provides in-memory implementations of the image store and the
//! donation repository that record every call, plus helpers for building
//! multipart request bodies and image fixtures.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use bytes::Bytes;
use chrono::Utc;
use http_body_util::BodyExt;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, Rgb, RgbImage};
use tokio::sync::RwLock;
use tower::ServiceExt;
use uuid::Uuid;

use donation_server::{
    create_router, Donation, DonationRepository, DonationService, ImageStore, NewDonation,
    PersistenceError, RouterConfig, UploadError,
};

// =============================================================================
// Mock Image Store
// =============================================================================

/// One recorded call to [`MockImageStore::upload`].
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub data: Bytes,
    pub content_type: String,
    pub folder: String,
}

/// An image store that records uploads and answers with a fixed result.
#[derive(Clone)]
pub struct MockImageStore {
    url: Option<String>,
    failure: Option<UploadError>,
    uploads: Arc<RwLock<Vec<RecordedUpload>>>,
    ping_ok: bool,
}

impl MockImageStore {
    /// A store whose uploads all succeed with `url`.
    pub fn returning(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            failure: None,
            uploads: Arc::new(RwLock::new(Vec::new())),
            ping_ok: true,
        }
    }

    /// A store whose uploads all fail with `error`.
    pub fn failing(error: UploadError) -> Self {
        Self {
            url: None,
            failure: Some(error),
            uploads: Arc::new(RwLock::new(Vec::new())),
            ping_ok: false,
        }
    }

    pub async fn upload_count(&self) -> usize {
        self.uploads.read().await.len()
    }

    pub async fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.read().await.clone()
    }
}

#[async_trait]
impl ImageStore for MockImageStore {
    async fn upload(
        &self,
        data: Bytes,
        content_type: &str,
        folder: &str,
    ) -> Result<String, UploadError> {
        self.uploads.write().await.push(RecordedUpload {
            data,
            content_type: content_type.to_string(),
            folder: folder.to_string(),
        });

        match (&self.url, &self.failure) {
            (_, Some(err)) => Err(err.clone()),
            (Some(url), None) => Ok(url.clone()),
            (None, None) => Err(UploadError::InvalidResponse("no url".to_string())),
        }
    }

    async fn ping(&self) -> Result<(), UploadError> {
        if self.ping_ok {
            Ok(())
        } else {
            Err(UploadError::Transport("unreachable".to_string()))
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

// =============================================================================
// Mock Donation Repository
// =============================================================================

/// An in-memory repository that records inserts.
#[derive(Clone, Default)]
pub struct MockDonationRepository {
    failure: Option<PersistenceError>,
    donations: Arc<RwLock<Vec<Donation>>>,
    create_calls: Arc<AtomicUsize>,
}

impl MockDonationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// A repository whose inserts and pings all fail with `error`.
    pub fn failing(error: PersistenceError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub async fn donations(&self) -> Vec<Donation> {
        self.donations.read().await.clone()
    }
}

#[async_trait]
impl DonationRepository for MockDonationRepository {
    async fn create(&self, donation: NewDonation) -> Result<Donation, PersistenceError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(ref err) = self.failure {
            return Err(err.clone());
        }

        let created = Donation {
            id: Uuid::new_v4(),
            name: donation.name().to_string(),
            amount: donation.amount(),
            image_url: donation.image_url().to_string(),
            created_at: Utc::now(),
        };
        self.donations.write().await.push(created.clone());
        Ok(created)
    }

    async fn ping(&self) -> Result<(), PersistenceError> {
        match self.failure {
            Some(ref err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Router Helpers
// =============================================================================

/// Build a router over the given mocks with tracing disabled.
pub fn test_router(store: &MockImageStore, repository: &MockDonationRepository) -> Router {
    let service = DonationService::new(Arc::new(store.clone()), Arc::new(repository.clone()));
    create_router(service, RouterConfig::new().with_tracing(false))
}

/// Send a request through the router.
pub async fn send(router: Router, request: Request<Body>) -> Response<Body> {
    router.oneshot(request).await.unwrap()
}

/// Read a response body as JSON.
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Read a response body as text.
pub async fn text_body(response: Response<Body>) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}

// =============================================================================
// Multipart Bodies
// =============================================================================

const BOUNDARY: &str = "----donation-test-boundary-7MA4YWxkTrZu0gW";

/// Builder for `multipart/form-data` request bodies.
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field.
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    /// Add a file field with a declared content type.
    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, file_name, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Finish the body and wrap it in a `POST /api/donation` request.
    pub fn into_request(mut self) -> Request<Body> {
        self.body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/donation")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}

/// A complete donation form with a JPEG proof.
pub fn donation_request(name: &str, amount: &str) -> Request<Body> {
    MultipartBody::new()
        .text("name", name)
        .text("amount", amount)
        .file("imageString", "proof.jpg", "image/jpeg", &create_test_jpeg())
        .into_request()
}

// =============================================================================
// Image Fixtures
// =============================================================================

/// A small valid JPEG (a couple of KB).
pub fn create_test_jpeg() -> Vec<u8> {
    let img = RgbImage::from_fn(48, 48, |x, y| {
        Rgb([(x * 5) as u8, (y * 5) as u8, ((x ^ y) * 3) as u8])
    });

    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, 90);
    encoder.encode_image(&img).unwrap();
    buf
}

/// A small valid PNG.
pub fn create_test_png() -> Vec<u8> {
    let img = RgbImage::from_pixel(16, 16, Rgb([200, 30, 30]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Check if data starts with the JPEG SOI marker.
pub fn is_valid_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}
