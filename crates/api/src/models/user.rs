//! User and profile domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forno_core::{Email, ProfileId, UserId};

/// A registered user (domain type).
///
/// The password hash never travels on this type; repositories return
/// it separately where verification needs it.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name, unique across the store.
    pub username: String,
    /// User's email address. Uniqueness is NOT enforced.
    pub email: Email,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Abbreviated user representation embedded in order payloads.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.as_str().to_owned(),
        }
    }
}

/// A user's profile: contact defaults plus the admin flag.
///
/// Created lazily on first `POST /profile`. `is_admin` is the sole
/// authorization signal for administrative actions; a user with no
/// profile is never an admin.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: ProfileId,
    #[serde(skip)]
    pub user_id: UserId,
    pub phone: String,
    pub default_address: String,
    pub is_admin: bool,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

/// Snapshot of the authenticated user stored in the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.as_str().to_owned(),
        }
    }
}

impl From<&CurrentUser> for UserSummary {
    fn from(user: &CurrentUser) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// Session keys used by the auth extractors.
pub mod session_keys {
    /// Key holding the [`CurrentUser`](super::CurrentUser) snapshot.
    pub const CURRENT_USER: &str = "current_user";
}
