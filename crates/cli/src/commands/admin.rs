//! Admin flag management commands.
//!
//! # Usage
//!
//! ```bash
//! # Grant the admin flag (creates an empty profile if needed)
//! forno-cli admin grant -u some_username
//!
//! # Revoke it
//! forno-cli admin revoke -u some_username
//! ```
//!
//! # Environment Variables
//!
//! - `FORNO_DATABASE_URL` - `PostgreSQL` connection string

use secrecy::SecretString;
use thiserror::Error;

use forno_api::db::profiles::ProfileRepository;
use forno_api::db::{RepositoryError, create_pool};

/// Errors that can occur during admin flag operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connect(#[from] sqlx::Error),

    /// No user with the given username.
    #[error("No user found with username: {0}")]
    UnknownUser(String),

    /// Repository error.
    #[error("Database error: {0}")]
    Repository(RepositoryError),
}

/// Set the admin flag for the user with the given username.
///
/// Creates an empty profile when the user has none yet.
///
/// # Errors
///
/// Returns `AdminError::UnknownUser` if the username does not exist.
pub async fn set_admin(username: &str, is_admin: bool) -> Result<(), AdminError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("FORNO_DATABASE_URL")
        .map_err(|_| AdminError::MissingEnvVar("FORNO_DATABASE_URL"))?;

    let pool = create_pool(&SecretString::from(database_url)).await?;

    let profile = ProfileRepository::new(&pool)
        .set_admin_by_username(username, is_admin)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AdminError::UnknownUser(username.to_owned()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!(
        username = username,
        is_admin = profile.is_admin,
        "Admin flag updated"
    );

    Ok(())
}
