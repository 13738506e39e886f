//! Guest session maintenance commands.
//!
//! # Usage
//!
//! ```bash
//! tl-cli sessions purge
//! ```
//!
//! Guest sessions expire seven days after they are minted but the rows
//! stay behind until something deletes them. Run this on a schedule.
//! Carts owned by purged sessions are deleted with them.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string

use sqlx::PgPool;
use thiserror::Error;

use treadline_storefront::db::{GuestSessionRepo, PgStore, RepositoryError};

/// Errors that can occur during session maintenance.
#[derive(Debug, Error)]
pub enum SessionsError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Repository operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Delete guest sessions past their expiry.
///
/// # Errors
///
/// Returns an error if `STOREFRONT_DATABASE_URL` is unset or the delete
/// fails.
pub async fn purge() -> Result<(), SessionsError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("STOREFRONT_DATABASE_URL")
        .map_err(|_| SessionsError::MissingEnvVar("STOREFRONT_DATABASE_URL"))?;

    tracing::info!("Connecting to storefront database...");
    let pool = PgPool::connect(&database_url).await?;

    let store = PgStore::new(pool);
    let purged = store.delete_expired_sessions().await?;

    tracing::info!(purged, "Expired guest sessions deleted");
    Ok(())
}
