//! # Donation Server
//!
//! A small web service that records donations together with a
//! proof-of-payment image.
//!
//! A donor submits a multipart form with their name, the amount and a JPEG or
//! PNG image. The image is checked, handed to a remote image host (Cloudinary
//! or an S3 bucket), and the donation is stored in PostgreSQL with the image's
//! public URL.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`upload`] - Upload intake rules (allowed types, size ceiling)
//! - [`store`] - Image store gateway and its Cloudinary/S3 backends
//! - [`donation`] - Donation model, repository and submission pipeline
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and environment configuration
//! - [`error`] - Error types for every stage
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use donation_server::{
//!     create_router, CloudinaryCredentials, CloudinaryStore, DonationService,
//!     PgDonationRepository, RouterConfig, DEFAULT_CLOUDINARY_API_BASE,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let images = CloudinaryStore::new(
//!         CloudinaryCredentials::new("my-cloud", "api-key", "api-secret"),
//!         DEFAULT_CLOUDINARY_API_BASE,
//!     )?;
//!     let repository = PgDonationRepository::connect("postgres://localhost/donations", 5).await?;
//!     repository.run_migrations().await?;
//!
//!     let service = DonationService::new(Arc::new(images), Arc::new(repository));
//!     let router = create_router(service, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod donation;
pub mod error;
pub mod server;
pub mod store;
pub mod upload;

// Re-export commonly used types
pub use config::{Config, ImageStoreKind};
pub use donation::{
    parse_amount, validate_name, Donation, DonationForm, DonationRepository, DonationService,
    NewDonation, PgDonationRepository, ValidatedSubmission,
};
pub use error::{ConfigError, DonationError, PersistenceError, UploadError, ValidationError};
pub use server::{
    create_router, donation_handler, health_handler, AppState, DonationResponse, ErrorResponse,
    HealthResponse, RouterConfig,
};
pub use store::{
    create_s3_client, sign_params, CloudinaryCredentials, CloudinaryStore, ImageStore,
    S3ImageStore, DEFAULT_CLOUDINARY_API_BASE,
};
pub use upload::{UploadedFile, ALLOWED_IMAGE_TYPES, MAX_IMAGE_BYTES};
