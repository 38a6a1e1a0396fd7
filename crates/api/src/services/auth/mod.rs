//! Authentication service.
//!
//! Handles registration and password login. Passwords are hashed
//! with argon2; validation failures surface as per-field messages.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use forno_core::Email;

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::error::FieldErrors;
use crate::models::user::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum username length.
const MAX_USERNAME_LENGTH: usize = 100;

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new user with username, email, and password.
    ///
    /// Duplicate usernames are rejected by the store's uniqueness
    /// constraint and surfaced as a field error. Duplicate emails are
    /// not checked.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` with per-field messages if the
    /// input is invalid or the username is taken.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let email = validate_registration(username, email, password)?;

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(username, &email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::Validation(FieldErrors::single(
                    "username",
                    "A user with that username already exists.",
                )),
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username is
    /// unknown or the password is wrong.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let (user, password_hash) = self
            .users
            .get_password_hash(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }
}

/// Validate registration input, returning the parsed email.
///
/// The username limit counts characters, not bytes, so multibyte
/// usernames are measured the same way clients display them.
///
/// # Errors
///
/// Returns `AuthError::Validation` with per-field messages.
fn validate_registration(username: &str, email: &str, password: &str) -> Result<Email, AuthError> {
    let mut errors = FieldErrors::new();

    if username.trim().is_empty() {
        errors.add("username", "This field may not be blank.");
    } else if username.chars().count() > MAX_USERNAME_LENGTH {
        errors.add(
            "username",
            format!("Ensure this field has no more than {MAX_USERNAME_LENGTH} characters."),
        );
    }

    let email = match Email::parse(email) {
        Ok(email) => Some(email),
        Err(_) => {
            errors.add("email", "Enter a valid email address.");
            None
        }
    };

    if password.len() < MIN_PASSWORD_LENGTH {
        errors.add(
            "password",
            format!("Ensure this field has at least {MIN_PASSWORD_LENGTH} characters."),
        );
    }

    // An invalid email always records a field error, so a clean
    // error set implies the parse succeeded.
    match email.filter(|_| errors.is_empty()) {
        Some(email) => Ok(email),
        None => Err(AuthError::Validation(errors)),
    }
}

/// Hash a password with argon2 and a fresh salt.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored argon2 hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|_| AuthError::PasswordHash)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).is_ok());
    }

    #[test]
    fn test_verify_rejects_wrong_password() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_username_limit_counts_characters_not_bytes() {
        // 100 two-byte characters: 200 bytes, exactly at the limit
        let username = "é".repeat(MAX_USERNAME_LENGTH);
        assert!(validate_registration(&username, "user@example.com", "hunter2hunter2").is_ok());

        let too_long = "é".repeat(MAX_USERNAME_LENGTH + 1);
        assert!(matches!(
            validate_registration(&too_long, "user@example.com", "hunter2hunter2"),
            Err(AuthError::Validation(_))
        ));
    }

    #[test]
    fn test_registration_validation_collects_field_errors() {
        let err = validate_registration("", "not-an-email", "short").unwrap_err();
        let AuthError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let json = serde_json::to_value(&errors).unwrap();
        assert!(json["username"].is_array());
        assert!(json["email"].is_array());
        assert!(json["password"].is_array());
    }
}
