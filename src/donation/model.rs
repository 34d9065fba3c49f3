use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::upload::UploadedFile;

/// A persisted donation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    /// Store-generated identifier
    pub id: Uuid,

    /// Donor name, trimmed
    pub name: String,

    /// Donated amount, finite and strictly positive
    pub amount: f64,

    /// Public URL of the proof-of-payment image
    #[sqlx(rename = "image_string")]
    pub image_url: String,

    /// Insert time, set by the store
    pub created_at: DateTime<Utc>,
}

/// A donation that passed validation and has a hosted image, ready to insert.
///
/// Only constructible through [`NewDonation::new`], which re-checks the name
/// and amount invariants.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDonation {
    name: String,
    amount: f64,
    image_url: String,
}

impl NewDonation {
    pub fn new(
        name: &str,
        amount: f64,
        image_url: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            name: validate_name(Some(name))?,
            amount: validate_amount(amount)?,
            image_url: image_url.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }
}

/// Raw fields of a donation submission as read from the request.
#[derive(Debug, Clone, Default)]
pub struct DonationForm {
    pub name: Option<String>,
    pub amount: Option<String>,
    pub image: Option<UploadedFile>,
}

/// A submission whose fields all passed intake validation.
#[derive(Debug, Clone)]
pub struct ValidatedSubmission {
    pub name: String,
    pub amount: f64,
    pub image: UploadedFile,
}

impl DonationForm {
    /// Validate name, then amount, then presence of the image.
    ///
    /// The first failing check wins.
    pub fn validate(self) -> Result<ValidatedSubmission, ValidationError> {
        let name = validate_name(self.name.as_deref())?;
        let amount = parse_amount(self.amount.as_deref())?;
        let image = self.image.ok_or(ValidationError::MissingImage)?;

        Ok(ValidatedSubmission {
            name,
            amount,
            image,
        })
    }
}

/// Trim a donor name, rejecting missing or whitespace-only names.
pub fn validate_name(raw: Option<&str>) -> Result<String, ValidationError> {
    match raw.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(ValidationError::InvalidName),
    }
}

/// Parse an amount from form text.
///
/// Surrounding whitespace is ignored. Anything that is not a finite number
/// strictly greater than zero is rejected.
pub fn parse_amount(raw: Option<&str>) -> Result<f64, ValidationError> {
    let amount = raw
        .map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or(ValidationError::InvalidAmount)?;

    validate_amount(amount)
}

fn validate_amount(amount: f64) -> Result<f64, ValidationError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(ValidationError::InvalidAmount)
    }
}
