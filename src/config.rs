//! Configuration management for the donation server.
//!
//! Settings come from command-line flags or the environment. A `.env` file in
//! the working directory is loaded into the environment before parsing, so
//! the usual deployment variables work unchanged:
//!
//! - `HOST` - Server bind address (default: 0.0.0.0)
//! - `PORT` - Server port (default: 5000)
//! - `DATABASE_URL` - PostgreSQL connection string (required)
//! - `DATABASE_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `IMAGE_STORE` - `cloudinary` or `s3` (default: cloudinary)
//! - `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET` -
//!   Image host credentials (required for cloudinary)
//! - `CLOUDINARY_API_BASE` - Image host API base URL
//! - `S3_BUCKET`, `S3_PUBLIC_URL` - Bucket and its public URL (required for s3)
//! - `S3_ENDPOINT`, `S3_REGION` - Custom S3 endpoint and region
//! - `UPLOAD_FOLDER` - Folder for uploaded proofs (default: donation-proofs)
//! - `CORS_ORIGINS` - Allowed CORS origins, comma-separated (default: any)
//!
//! Presence is checked by [`Config::validate`], not by clap, so that a missing
//! credential is reported as a [`ConfigError`] naming both the flag and the
//! environment variable.

use clap::{Parser, ValueEnum};

use crate::error::ConfigError;
use crate::store::{CloudinaryCredentials, DEFAULT_CLOUDINARY_API_BASE};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default database pool size.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default folder uploaded proofs are placed in.
pub const DEFAULT_UPLOAD_FOLDER: &str = "donation-proofs";

/// Which image host backs the gateway.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStoreKind {
    /// Cloudinary signed uploads
    Cloudinary,
    /// S3 or S3-compatible bucket with a public URL
    S3,
}

// =============================================================================
// CLI Arguments
// =============================================================================

/// Donation server - accepts donation proofs and records donations.
#[derive(Parser, Debug, Clone)]
#[command(name = "donation-server")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    // =========================================================================
    // Database Configuration
    // =========================================================================
    /// PostgreSQL connection string.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Maximum number of pooled database connections.
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS, env = "DATABASE_MAX_CONNECTIONS")]
    pub database_max_connections: u32,

    // =========================================================================
    // Image Store Configuration
    // =========================================================================
    /// Image host used for proof-of-payment uploads.
    #[arg(long, value_enum, default_value_t = ImageStoreKind::Cloudinary, env = "IMAGE_STORE")]
    pub image_store: ImageStoreKind,

    /// Folder uploaded proofs are stored under.
    #[arg(long, default_value = DEFAULT_UPLOAD_FOLDER, env = "UPLOAD_FOLDER")]
    pub upload_folder: String,

    /// Cloudinary cloud (account) name.
    #[arg(long, env = "CLOUDINARY_CLOUD_NAME")]
    pub cloudinary_cloud_name: Option<String>,

    /// Cloudinary API key.
    #[arg(long, env = "CLOUDINARY_API_KEY", hide_env_values = true)]
    pub cloudinary_api_key: Option<String>,

    /// Cloudinary API secret.
    #[arg(long, env = "CLOUDINARY_API_SECRET", hide_env_values = true)]
    pub cloudinary_api_secret: Option<String>,

    /// Cloudinary API base URL.
    #[arg(long, default_value = DEFAULT_CLOUDINARY_API_BASE, env = "CLOUDINARY_API_BASE")]
    pub cloudinary_api_base: String,

    /// S3 bucket receiving uploaded proofs.
    #[arg(long, env = "S3_BUCKET")]
    pub s3_bucket: Option<String>,

    /// Public base URL objects in the bucket are served from.
    #[arg(long, env = "S3_PUBLIC_URL")]
    pub s3_public_url: Option<String>,

    /// Custom S3 endpoint URL for S3-compatible services (MinIO, etc.).
    #[arg(long, env = "S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "S3_REGION")]
    pub s3_region: String,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

/// Treat unset and blank values the same way.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Config {
    /// Validate the configuration.
    ///
    /// Checks presence of the database URL and of the credentials the selected
    /// image store needs, plus values that would only fail later at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database_url()?;

        if self.database_max_connections == 0 {
            return Err(ConfigError::Invalid {
                name: "database_max_connections",
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.upload_folder.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: "upload_folder",
                reason: "must not be empty".to_string(),
            });
        }

        match self.image_store {
            ImageStoreKind::Cloudinary => {
                self.cloudinary_credentials()?;
                check_absolute_url("cloudinary_api_base", &self.cloudinary_api_base)?;
            }
            ImageStoreKind::S3 => {
                self.s3_bucket()?;
                check_absolute_url("s3_public_url", self.s3_public_url()?)?;
            }
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The database connection string.
    pub fn database_url(&self) -> Result<&str, ConfigError> {
        present(&self.database_url).ok_or(ConfigError::Missing {
            name: "database URL",
            flag: "database-url",
            env: "DATABASE_URL",
        })
    }

    /// Cloudinary credentials. Every part must be present and non-empty.
    pub fn cloudinary_credentials(&self) -> Result<CloudinaryCredentials, ConfigError> {
        let cloud_name = present(&self.cloudinary_cloud_name).ok_or(ConfigError::Missing {
            name: "Cloudinary cloud name",
            flag: "cloudinary-cloud-name",
            env: "CLOUDINARY_CLOUD_NAME",
        })?;
        let api_key = present(&self.cloudinary_api_key).ok_or(ConfigError::Missing {
            name: "Cloudinary API key",
            flag: "cloudinary-api-key",
            env: "CLOUDINARY_API_KEY",
        })?;
        let api_secret = present(&self.cloudinary_api_secret).ok_or(ConfigError::Missing {
            name: "Cloudinary API secret",
            flag: "cloudinary-api-secret",
            env: "CLOUDINARY_API_SECRET",
        })?;

        Ok(CloudinaryCredentials::new(cloud_name, api_key, api_secret))
    }

    /// The S3 bucket for uploads.
    pub fn s3_bucket(&self) -> Result<&str, ConfigError> {
        present(&self.s3_bucket).ok_or(ConfigError::Missing {
            name: "S3 bucket",
            flag: "s3-bucket",
            env: "S3_BUCKET",
        })
    }

    /// The public base URL of the S3 bucket.
    pub fn s3_public_url(&self) -> Result<&str, ConfigError> {
        present(&self.s3_public_url).ok_or(ConfigError::Missing {
            name: "S3 public URL",
            flag: "s3-public-url",
            env: "S3_PUBLIC_URL",
        })
    }
}

fn check_absolute_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value).map_err(|e| ConfigError::Invalid {
        name,
        reason: format!("{}: {}", value, e),
    })?;

    if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            name,
            reason: format!("{} is not an absolute http(s) URL", value),
        });
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
