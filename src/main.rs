//! Donation server - records donations with proof-of-payment images.
//!
//! This binary starts the HTTP server and configures all components.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use donation_server::{
    config::{Config, ImageStoreKind},
    create_router, create_s3_client,
    donation::{DonationService, PgDonationRepository},
    error::ConfigError,
    server::RouterConfig,
    store::{CloudinaryStore, ImageStore, S3ImageStore},
};

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal in production
    let dotenv = dotenvy::dotenv();

    let config = Config::parse();
    init_logging(config.verbose);

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    run_serve(config).await
}

async fn run_serve(config: Config) -> ExitCode {
    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Donation server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Image store: {:?}", config.image_store);
    info!("  Upload folder: {}", config.upload_folder);
    info!("  Database pool: {} connection(s)", config.database_max_connections);
    match &config.cors_origins {
        Some(origins) => info!("  CORS origins: {}", origins.join(", ")),
        None => warn!("  CORS: any origin allowed"),
    }

    // Image store
    let images = match build_image_store(&config).await {
        Ok(images) => images,
        Err(e) => {
            error!("Image store initialization failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("");
    info!("Checking image store connectivity...");
    match images.ping().await {
        Ok(()) => info!("  {} reachable", images.name()),
        Err(e) => {
            warn!("  {} connectivity test failed: {}", images.name(), e);
            warn!("  Uploads will fail until the image host is reachable");
        }
    }

    // Database
    info!("Connecting to database...");
    let database_url = match config.database_url() {
        Ok(url) => url,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let repository =
        match PgDonationRepository::connect(database_url, config.database_max_connections).await {
            Ok(repository) => repository,
            Err(e) => {
                error!("  Failed to connect to database: {}", e);
                error!("");
                error!("  Please check:");
                error!("    - DATABASE_URL points at a running PostgreSQL server");
                error!("    - The credentials in the URL are correct");
                return ExitCode::FAILURE;
            }
        };
    if let Err(e) = repository.run_migrations().await {
        error!("  Failed to apply migrations: {}", e);
        return ExitCode::FAILURE;
    }
    info!("  Connected, schema up to date");

    let service = DonationService::new(images, Arc::new(repository))
        .with_folder(config.upload_folder.trim());

    let router = create_router(service, build_router_config(&config));

    // Bind and serve
    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!(
        "    curl -F name=Ali -F amount=500 -F imageString=@proof.jpg http://{}/api/donation",
        addr
    );
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Server stopped");
    ExitCode::SUCCESS
}

/// Build the configured image store.
async fn build_image_store(config: &Config) -> Result<Arc<dyn ImageStore>, ConfigError> {
    match config.image_store {
        ImageStoreKind::Cloudinary => {
            let credentials = config.cloudinary_credentials()?;
            info!("  Cloudinary cloud: {}", credentials.cloud_name());
            let store = CloudinaryStore::new(credentials, config.cloudinary_api_base.as_str())?;
            Ok(Arc::new(store))
        }
        ImageStoreKind::S3 => {
            let bucket = config.s3_bucket()?;
            let public_url = config.s3_public_url()?;
            info!("  S3 bucket: {}", bucket);
            if let Some(ref endpoint) = config.s3_endpoint {
                info!("  S3 endpoint: {}", endpoint);
            }
            info!("  S3 region: {}", config.s3_region);

            let client = create_s3_client(config.s3_endpoint.as_deref(), &config.s3_region).await;
            Ok(Arc::new(S3ImageStore::new(client, bucket, public_url)))
        }
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "donation_server=debug,tower_http=debug"
    } else {
        "donation_server=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new();

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}

/// Resolve on Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
