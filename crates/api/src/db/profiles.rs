//! Profile repository for database operations.
//!
//! The profile is the authorization record: `is_admin` here is the
//! sole signal gating catalog mutation and status updates. The lookup
//! is an explicit optional query; a user without a profile row is
//! simply not an admin.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use forno_core::{ProfileId, UserId};

use super::RepositoryError;
use crate::models::user::Profile;

/// Internal row type for `PostgreSQL` profile queries.
#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: i32,
    user_id: i32,
    phone: String,
    default_address: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: ProfileId::new(row.id),
            user_id: UserId::new(row.user_id),
            phone: row.phone,
            default_address: row.default_address,
            is_admin: row.is_admin,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for profile database operations.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find the profile belonging to a user, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_user(&self, user_id: UserId) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r"
            SELECT id, user_id, phone, default_address, is_admin, created_at, updated_at
            FROM profile
            WHERE user_id = $1
            ",
        )
        .bind(user_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Whether the user is an admin.
    ///
    /// A missing profile means not an admin.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_admin(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let profile = self.find_by_user(user_id).await?;
        Ok(profile.is_some_and(|p| p.is_admin))
    }

    /// Create a profile for a user.
    ///
    /// `is_admin` always starts false; it is never client-settable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already has a profile.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        user_id: UserId,
        phone: &str,
        default_address: &str,
    ) -> Result<Profile, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r"
            INSERT INTO profile (user_id, phone, default_address)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, phone, default_address, is_admin, created_at, updated_at
            ",
        )
        .bind(user_id.as_i32())
        .bind(phone)
        .bind(default_address)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("profile already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into())
    }

    /// Set the admin flag for the user with the given username,
    /// creating an empty profile if they have none yet.
    ///
    /// Used by the management CLI.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such user exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_admin_by_username(
        &self,
        username: &str,
        is_admin: bool,
    ) -> Result<Profile, RepositoryError> {
        let user_id: Option<(i32,)> = sqlx::query_as(r#"SELECT id FROM "user" WHERE username = $1"#)
            .bind(username)
            .fetch_optional(self.pool)
            .await?;

        let (user_id,) = user_id.ok_or(RepositoryError::NotFound)?;

        let row = sqlx::query_as::<_, ProfileRow>(
            r"
            INSERT INTO profile (user_id, is_admin)
            VALUES ($1, $2)
            ON CONFLICT (user_id)
            DO UPDATE SET is_admin = EXCLUDED.is_admin, updated_at = now()
            RETURNING id, user_id, phone, default_address, is_admin, created_at, updated_at
            ",
        )
        .bind(user_id)
        .bind(is_admin)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}
