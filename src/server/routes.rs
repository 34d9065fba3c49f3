//! Router configuration for the donation server.
//!
//! # Route Structure
//!
//! ```text
//! /                        - Liveness text (GET)
//! /health                  - Health check (GET)
//! /api/donation            - Donation submission (POST, multipart)
//! /api/auth/...            - Not implemented (501)
//! /api/transaction/...     - Not implemented (501)
//! /api/admin/...           - Not implemented (501)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use donation_server::server::routes::{create_router, RouterConfig};
//!
//! let service = DonationService::new(images, repository);
//! let config = RouterConfig::new()
//!     .with_cors_origins(vec!["https://example.org".to_string()]);
//!
//! let router = create_router(service, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{any, get, post},
    Router,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    donation_handler, health_handler, not_implemented_handler, root_handler, AppState,
};
use crate::donation::DonationService;
use crate::upload::MAX_IMAGE_BYTES;

/// Request body limit for donation submissions.
///
/// Twice the image ceiling, so a slightly oversized image still reaches
/// upload intake and gets its specific error message.
pub const MAX_REQUEST_BYTES: usize = 2 * MAX_IMAGE_BYTES;

/// Sibling APIs that are routed but not implemented.
const STUB_PREFIXES: &[&str] = &["/api/auth", "/api/transaction", "/api/admin"];

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterConfig {
    /// Create a router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    /// Pass None (or don't call this method) to allow any origin.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// # Arguments
///
/// * `donations` - The donation submission pipeline
/// * `config` - Router configuration
pub fn create_router(donations: DonationService, config: RouterConfig) -> Router {
    let app_state = AppState::new(donations);
    let cors = build_cors_layer(&config);

    let mut router = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route(
            "/api/donation",
            post(donation_handler).layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES)),
        );

    for prefix in STUB_PREFIXES {
        router = router
            .route(prefix, any(not_implemented_handler))
            .route(&format!("{}/", prefix), any(not_implemented_handler))
            .route(&format!("{}/{{*rest}}", prefix), any(not_implemented_handler));
    }

    let router = router.with_state(app_state).layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
///
/// Explicit origins also allow credentials, which browsers refuse to combine
/// with a wildcard origin.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            cors.allow_origin(parsed_origins).allow_credentials(true)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
