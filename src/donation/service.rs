//! The donation submission pipeline.
//!
//! ```text
//! DonationForm ──validate──▶ ImageStore::upload ──URL──▶ DonationRepository::create
//!      │                          │                            │
//!      ▼                          ▼                            ▼
//!  ValidationError            UploadError               PersistenceError
//! ```
//!
//! Each stage runs only if the previous one succeeded. A failed upload never
//! reaches the repository. A failed insert leaves the uploaded image in place
//! on the image host: there is no compensating delete.

use std::sync::Arc;

use tracing::{debug, error, info};

use super::model::{Donation, DonationForm, NewDonation};
use super::repository::DonationRepository;
use crate::config::DEFAULT_UPLOAD_FOLDER;
use crate::error::DonationError;
use crate::store::ImageStore;

/// Orchestrates validation, image upload and persistence of donations.
///
/// Holds no per-request state, so one instance is shared by all handlers.
pub struct DonationService {
    images: Arc<dyn ImageStore>,
    repository: Arc<dyn DonationRepository>,
    folder: String,
}

impl DonationService {
    /// Create a service uploading into the default folder.
    pub fn new(images: Arc<dyn ImageStore>, repository: Arc<dyn DonationRepository>) -> Self {
        Self {
            images,
            repository,
            folder: DEFAULT_UPLOAD_FOLDER.to_string(),
        }
    }

    /// Set the folder uploaded proofs are placed in.
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    /// The donation repository in use.
    pub fn repository(&self) -> &dyn DonationRepository {
        self.repository.as_ref()
    }

    /// Validate and record a donation.
    pub async fn submit(&self, form: DonationForm) -> Result<Donation, DonationError> {
        let submission = form.validate()?;

        debug!(
            name = %submission.name,
            amount = submission.amount,
            file_name = submission.image.file_name().unwrap_or("-"),
            size = submission.image.size(),
            "Donation passed intake"
        );

        let image_url = self
            .images
            .upload(
                submission.image.data().clone(),
                submission.image.content_type(),
                &self.folder,
            )
            .await
            .map_err(|e| {
                error!(store = self.images.name(), error = %e, "Image upload failed");
                e
            })?;

        info!(url = %image_url, "Image uploaded");

        let new_donation = NewDonation::new(&submission.name, submission.amount, image_url)?;

        let donation = self.repository.create(new_donation).await.map_err(|e| {
            error!(
                error = %e,
                "Failed to save donation; uploaded image is left on the image host"
            );
            e
        })?;

        info!(id = %donation.id, amount = donation.amount, "Donation saved");

        Ok(donation)
    }
}
