//! Database migration command.
//!
//! Applies the embedded migrations from `crates/api/migrations/`. The server
//! never migrates implicitly at startup; this command is the only migration
//! path.
//!
//! # Environment Variables
//!
//! - `CLOVE_DATABASE_URL` - `SQLite` connection string (falls back to
//!   `DATABASE_URL`)

use secrecy::SecretString;

use clove_api::db;

/// Errors that can occur while migrating.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run all pending migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database URL is missing, the database
/// cannot be opened, or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    db::MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}

fn database_url() -> Result<SecretString, MigrationError> {
    std::env::var("CLOVE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("CLOVE_DATABASE_URL"))
}
