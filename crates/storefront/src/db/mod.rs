//! Database operations for the storefront `PostgreSQL`.
//!
//! # Database: `treadline`
//!
//! All storefront data lives in the `storefront` schema:
//!
//! ## Tables
//!
//! - `user` - Site authentication accounts
//! - `user_password` - Password hashes, one row per user
//! - `guest_session` - Anonymous cart-bearing sessions with a 7-day TTL
//! - `product`, `color`, `size`, `product_variant` - The shoe catalog
//! - `cart` - One cart per owner (user or guest)
//! - `cart_item` - Cart contents, one row per variant
//! - `tower_sessions.session` - Cookie session storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p treadline-cli -- migrate
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub mod carts;
pub mod catalog;
pub mod guests;
pub mod memory;
pub mod store;
pub mod users;

pub use memory::MemoryStore;
pub use store::{CartRepo, CatalogRepo, GuestSessionRepo, Store, UserRepo};

// =============================================================================
// Errors
// =============================================================================

/// Errors that can occur during repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is in an invalid state.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The requested entity was not found.
    #[error("not found")]
    NotFound,

    /// A uniqueness constraint would be violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The operation would leave a row in an invalid state.
    #[error("validation: {0}")]
    Validation(String),

    /// An in-memory lock was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

// =============================================================================
// Connection Pool
// =============================================================================

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

// =============================================================================
// Postgres Store
// =============================================================================

/// The `PostgreSQL`-backed [`Store`].
///
/// A thin wrapper around the connection pool; the per-entity `impl` blocks
/// live in the sibling modules (`users`, `guests`, `carts`, `catalog`).
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
