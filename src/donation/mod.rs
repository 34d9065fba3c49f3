//! Donations: the data model, its persistence and the submission pipeline.

mod model;
mod repository;
mod service;

pub use model::{
    parse_amount, validate_name, Donation, DonationForm, NewDonation, ValidatedSubmission,
};
pub use repository::{DonationRepository, PgDonationRepository};
pub use service::DonationService;
