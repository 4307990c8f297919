//! Database operations for the Clove store.
//!
//! The store is an embedded `SQLite` database accessed through sqlx. Each
//! aggregate gets its own repository module:
//!
//! - [`collections`] / [`products`] / [`promotions`] - catalog
//! - [`customers`] - customers and their address
//! - [`carts`] - carts and cart items
//! - [`orders`] - orders and order items
//! - [`reviews`] - product reviews
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/`, embedded into the
//! binary via [`MIGRATOR`], and run via:
//! ```bash
//! cargo run -p clove-cli -- migrate
//! ```

use std::str::FromStr;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub mod carts;
pub mod collections;
pub mod customers;
pub mod orders;
pub mod products;
pub mod promotions;
pub mod reviews;

pub use carts::CartRepository;
pub use collections::CollectionRepository;
pub use customers::CustomerRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use promotions::PromotionRepository;
pub use reviews::ReviewRepository;

/// Embedded schema migrations (`crates/api/migrations/`).
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Referential-integrity or uniqueness violation.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `SQLite` connection pool with sensible defaults.
///
/// Foreign-key enforcement is switched on for every connection; the deletion
/// guards and cascade rules in the schema depend on it.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the database cannot be
/// opened.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<SqlitePool, sqlx::Error> {
    let url = database_url.expose_secret();
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    // An in-memory database exists per connection; a second pool connection
    // would see an unrelated empty database, and recycling the only
    // connection would drop the data with it.
    if url.contains(":memory:") {
        return SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await;
    }

    SqlitePoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}
