use http::StatusCode;
use thiserror::Error;

/// Client-caused problems with a donation submission (HTTP 400).
///
/// The `Display` text of each variant is the message returned to the client.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Donor name missing or whitespace-only
    #[error("Please provide a valid name")]
    InvalidName,

    /// Amount missing, not a number, not finite, or not strictly positive
    #[error("Amount must be a positive number")]
    InvalidAmount,

    /// No proof-of-payment file in the form
    #[error("Image is required and must be valid")]
    MissingImage,

    /// Declared content type is not on the allow-list
    #[error("Only JPEG, PNG, or JPG images are allowed")]
    UnsupportedImageType { content_type: Option<String> },

    /// File exceeds the intake size ceiling
    #[error("Image must not exceed {} MB", .max / (1024 * 1024))]
    ImageTooLarge { size: usize, max: usize },

    /// The multipart body could not be read (truncated, over the body limit, ...)
    #[error("{message}")]
    MalformedForm { message: String, status: StatusCode },
}

impl ValidationError {
    /// HTTP status for this error. Everything is a 400 except transport level
    /// multipart failures, which keep the status axum assigned them.
    pub fn status(&self) -> StatusCode {
        match self {
            ValidationError::MalformedForm { status, .. } => *status,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Failures talking to the image host.
#[derive(Debug, Clone, Error)]
pub enum UploadError {
    /// Network, TLS or SDK level failure
    #[error("Image host request failed: {0}")]
    Transport(String),

    /// The image host answered with a non-success status
    #[error("Image host rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The image host answered 2xx but without a usable URL
    #[error("Invalid response from image host: {0}")]
    InvalidResponse(String),
}

/// Failures writing to or reaching the donation store.
#[derive(Debug, Clone, Error)]
pub enum PersistenceError {
    /// Connection, query or constraint failure
    #[error("Database error: {0}")]
    Database(String),

    /// Embedded schema migrations could not be applied
    #[error("Migration error: {0}")]
    Migration(String),
}

impl From<sqlx::Error> for PersistenceError {
    fn from(err: sqlx::Error) -> Self {
        PersistenceError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for PersistenceError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        PersistenceError::Migration(err.to_string())
    }
}

/// Startup configuration problems. The process refuses to serve traffic.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A required setting is absent or empty
    #[error("Missing {name}. Set --{flag} or {env}")]
    Missing {
        name: &'static str,
        flag: &'static str,
        env: &'static str,
    },

    /// A setting is present but unusable
    #[error("Invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Errors produced by the donation submission pipeline.
#[derive(Debug, Clone, Error)]
pub enum DonationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl DonationError {
    /// HTTP status the pipeline failure maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            DonationError::Validation(err) => err.status(),
            DonationError::Upload(_) | DonationError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
