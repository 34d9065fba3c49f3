//! Persistence boundary for donations.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::debug;

use super::model::{Donation, NewDonation};
use crate::error::PersistenceError;

/// Connect timeout for the database pool.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Storage for donation records.
///
/// Records are only ever inserted here; updates and deletes are not part of
/// the intake path.
#[async_trait]
pub trait DonationRepository: Send + Sync {
    /// Insert a donation, returning it with its generated id and timestamp.
    async fn create(&self, donation: NewDonation) -> Result<Donation, PersistenceError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), PersistenceError>;
}

/// PostgreSQL implementation of [`DonationRepository`].
#[derive(Clone)]
pub struct PgDonationRepository {
    pool: PgPool,
}

impl PgDonationRepository {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a new pool to the given database URL.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self, PersistenceError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(CONNECT_TIMEOUT)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Apply the embedded schema migrations.
    pub async fn run_migrations(&self) -> Result<(), PersistenceError> {
        Ok(sqlx::migrate!().run(&self.pool).await?)
    }
}

#[async_trait]
impl DonationRepository for PgDonationRepository {
    async fn create(&self, donation: NewDonation) -> Result<Donation, PersistenceError> {
        let created = sqlx::query_as::<_, Donation>(
            r#"
            INSERT INTO donations (name, amount, image_string)
            VALUES ($1, $2, $3)
            RETURNING id, name, amount, image_string, created_at
            "#,
        )
        .bind(donation.name())
        .bind(donation.amount())
        .bind(donation.image_url())
        .fetch_one(&self.pool)
        .await?;

        debug!(id = %created.id, "Inserted donation");
        Ok(created)
    }

    async fn ping(&self) -> Result<(), PersistenceError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
