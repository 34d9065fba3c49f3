//! HTTP server layer for the donation service.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │              POST /api/donation (multipart/form-data)           │
//! │                                                                 │
//! │  ┌──────────────────────────────┐  ┌─────────────────────────┐  │
//! │  │          handlers            │  │         routes          │  │
//! │  │ (multipart intake, errors)   │  │ (CORS, limits, tracing) │  │
//! │  └──────────────────────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    donation_handler, health_handler, not_implemented_handler, read_donation_form, root_handler,
    AppState, DonationResponse, ErrorResponse, HealthResponse, IMAGE_FIELD, IMAGE_FIELD_ALIAS,
    PROCESSING_FAILED_MESSAGE,
};
pub use routes::{create_router, RouterConfig, MAX_REQUEST_BYTES};
