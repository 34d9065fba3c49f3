//! HTTP request handlers for the donation API.
//!
//! # Endpoints
//!
//! - `POST /api/donation` - Submit a donation with proof of payment
//! - `GET /health` - Health check endpoint
//! - `GET /` - Liveness text
//! - `/api/auth`, `/api/transaction`, `/api/admin` - Not implemented

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, multipart::MultipartRejection, Multipart, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::donation::{Donation, DonationForm, DonationService};
use crate::error::{DonationError, ValidationError};
use super::routes::MAX_REQUEST_BYTES;
use crate::upload::{check_content_type, check_size, UploadedFile, MAX_IMAGE_BYTES};

/// Multipart field carrying the proof-of-payment image.
pub const IMAGE_FIELD: &str = "imageString";

/// Alternative name accepted for the image field.
pub const IMAGE_FIELD_ALIAS: &str = "image";

/// Generic message returned with dependency failures.
pub const PROCESSING_FAILED_MESSAGE: &str = "Failed to process donation";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the donation service.
///
/// This is passed to all handlers via Axum's State extractor.
#[derive(Clone)]
pub struct AppState {
    /// The submission pipeline
    pub donations: Arc<DonationService>,
}

impl AppState {
    /// Create a new application state with the given donation service.
    pub fn new(donations: DonationService) -> Self {
        Self {
            donations: Arc::new(donations),
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response.
///
/// Validation failures carry only `message`; dependency failures add the
/// underlying cause in `error`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub message: String,

    /// Underlying cause, for server-side failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorResponse {
    /// Create an error response with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
        }
    }

    /// Create an error response with a message and a cause.
    pub fn with_cause(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: Some(error.into()),
        }
    }
}

/// Body of a successful donation submission.
#[derive(Debug, Serialize, Deserialize)]
pub struct DonationResponse {
    pub donation: Donation,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status ("healthy" or "degraded")
    pub status: String,

    /// Service version
    pub version: String,

    /// Database status ("ok" or "unavailable")
    pub database: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert DonationError to HTTP response.
///
/// Client errors are logged at WARN level, dependency failures at ERROR.
impl IntoResponse for DonationError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            DonationError::Validation(err) => {
                warn!(status = status.as_u16(), "Rejected donation: {}", err);
                ErrorResponse::new(err.to_string())
            }
            DonationError::Upload(err) => {
                error!(status = status.as_u16(), "Upload failed: {}", err);
                ErrorResponse::with_cause(PROCESSING_FAILED_MESSAGE, err.to_string())
            }
            DonationError::Persistence(err) => {
                error!(status = status.as_u16(), "Persistence failed: {}", err);
                ErrorResponse::with_cause(PROCESSING_FAILED_MESSAGE, err.to_string())
            }
        };

        (status, Json(body)).into_response()
    }
}

fn malformed(err: MultipartError) -> ValidationError {
    form_error(err.status(), err.body_text())
}

/// Map a multipart extraction failure to a validation error.
///
/// Bodies over the route's limit can only be that large because of the image,
/// so they get the same answer as an image that fails the size check.
fn form_error(status: StatusCode, message: String) -> ValidationError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        return ValidationError::ImageTooLarge {
            size: MAX_REQUEST_BYTES,
            max: MAX_IMAGE_BYTES,
        };
    }

    ValidationError::MalformedForm { message, status }
}

// =============================================================================
// Multipart Intake
// =============================================================================

/// Read the donation form out of a multipart body.
///
/// The image part is checked against the upload intake rules as soon as its
/// headers are seen, and its size is checked while it streams in, so an
/// invalid file is rejected before the rest of the form is considered.
/// An image part without a file name is not a file (browsers send an empty
/// one when no file was chosen) and counts as no file. Unknown fields are
/// skipped.
pub async fn read_donation_form(
    mut multipart: Multipart,
) -> Result<DonationForm, ValidationError> {
    let mut form = DonationForm::default();

    while let Some(mut field) = multipart.next_field().await.map_err(malformed)? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "name" => form.name = Some(field.text().await.map_err(malformed)?),
            "amount" => form.amount = Some(field.text().await.map_err(malformed)?),
            IMAGE_FIELD | IMAGE_FIELD_ALIAS => {
                if field.file_name().map_or(true, str::is_empty) {
                    debug!(field = %field_name, "Skipping image part without a file");
                    continue;
                }

                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                check_content_type(content_type.as_deref())?;

                let mut buffer = BytesMut::new();
                while let Some(chunk) = field.chunk().await.map_err(malformed)? {
                    check_size(buffer.len() + chunk.len())?;
                    buffer.extend_from_slice(&chunk);
                }

                debug!(
                    file_name = file_name.as_deref().unwrap_or("-"),
                    size = buffer.len(),
                    "Received image part"
                );

                form.image = Some(UploadedFile::accept(
                    file_name,
                    content_type.as_deref(),
                    buffer.freeze(),
                )?);
            }
            other => debug!(field = other, "Ignoring unexpected form field"),
        }
    }

    Ok(form)
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle donation submissions.
///
/// # Endpoint
///
/// `POST /api/donation` (multipart/form-data)
///
/// # Form Fields
///
/// - `name`: Donor name (required, non-blank)
/// - `amount`: Donated amount (required, > 0)
/// - `imageString` (or `image`): Proof of payment, JPEG or PNG, at most 5 MB
///
/// # Response
///
/// - `201 Created`: `{"donation": {"id", "name", "amount", "imageUrl", "createdAt"}}`
/// - `400 Bad Request`: `{"message"}` for invalid input
/// - `500 Internal Server Error`: `{"message", "error"}` when the image host or
///   database fails
pub async fn donation_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<DonationResponse>), DonationError> {
    info!("Incoming donation request");

    let multipart =
        multipart.map_err(|rejection| form_error(rejection.status(), rejection.body_text()))?;

    let form = read_donation_form(multipart).await?;
    let donation = state.donations.submit(form).await?;

    Ok((StatusCode::CREATED, Json(DonationResponse { donation })))
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` when the database answers, `503 Service Unavailable` otherwise:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "ok"
/// }
/// ```
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, health, database) = match state.donations.repository().ping().await {
        Ok(()) => (StatusCode::OK, "healthy", "ok"),
        Err(e) => {
            warn!("Health check: database unavailable: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unavailable")
        }
    };

    (
        status,
        Json(HealthResponse {
            status: health.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database.to_string(),
        }),
    )
}

/// Handle `GET /`.
pub async fn root_handler() -> &'static str {
    "Family Welfare Website Running."
}

/// Placeholder for the authentication, transaction and admin APIs.
pub async fn not_implemented_handler(uri: Uri) -> (StatusCode, Json<ErrorResponse>) {
    debug!(path = uri.path(), "Request to unimplemented endpoint");
    (
        StatusCode::NOT_IMPLEMENTED,
        Json(ErrorResponse::new(format!(
            "{} is not implemented",
            uri.path()
        ))),
    )
}

// =============================================================================
// Tests
// =============================================================================
