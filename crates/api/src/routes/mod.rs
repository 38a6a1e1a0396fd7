//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//! GET  /health/ready                - Readiness check (database ping)
//!
//! # Catalog
//! GET    /pizzas                    - List catalog (public)
//! GET    /pizzas/popular            - Popular subset (public)
//! POST   /pizzas                    - Create pizza (admin)
//! PUT    /pizzas/{id}               - Replace pizza (admin)
//! PATCH  /pizzas/{id}               - Partial update (admin)
//! DELETE /pizzas/{id}               - Delete pizza (admin)
//!
//! # Orders
//! GET   /orders                     - Own orders, or all if admin
//! POST  /orders                     - Create order (authenticated)
//! GET   /orders/{id}                - Single order (owner or admin)
//! PATCH /orders/{id}/update_status  - Set status label (admin)
//!
//! # Profile
//! GET  /profile                     - Own profile (authenticated)
//! POST /profile                     - Create own profile (authenticated)
//!
//! # Auth
//! POST /register                    - Create account (public)
//! POST /auth/login                  - Login, sets session cookie
//! POST /auth/logout                 - Logout, clears session
//! ```

pub mod auth;
pub mod orders;
pub mod pizzas;
pub mod profile;

use axum::{
    Router,
    routing::{get, patch, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::db::profiles::ProfileRepository;
use crate::error::{AppError, FieldErrors, Result};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Create the full API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/pizzas", pizza_routes())
        .nest("/orders", order_routes())
        .nest("/profile", profile_routes())
        .route("/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
}

/// Create the catalog routes router.
pub fn pizza_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pizzas::list).post(pizzas::create))
        .route("/popular", get(pizzas::popular))
        .route(
            "/{id}",
            axum::routing::put(pizzas::update)
                .patch(pizzas::partial_update)
                .delete(pizzas::delete),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list).post(orders::create))
        .route("/{id}", get(orders::show))
        .route("/{id}/update_status", patch(orders::update_status))
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/", get(profile::show).post(profile::create))
}

/// A decimal money field as received on the wire: either a string
/// (`"10.00"`) or a bare JSON number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MoneyField {
    Text(String),
    Number(serde_json::Number),
}

/// Parse a money field, recording a field error when it is missing
/// or not a valid decimal.
pub(crate) fn parse_money(
    value: Option<&MoneyField>,
    field: &str,
    errors: &mut FieldErrors,
) -> Option<Decimal> {
    let Some(value) = value else {
        errors.add(field, "This field is required.");
        return None;
    };

    let raw = match value {
        MoneyField::Text(s) => s.clone(),
        MoneyField::Number(n) => n.to_string(),
    };

    match raw.parse::<Decimal>() {
        Ok(amount) => Some(amount),
        Err(_) => {
            errors.add(field, "A valid number is required.");
            None
        }
    }
}

/// Require that the caller's profile carries the admin flag.
///
/// The lookup is an explicit optional-profile query; a user without a
/// profile is treated as not an admin.
///
/// # Errors
///
/// Returns `AppError::Forbidden` for non-admins.
pub(crate) async fn require_admin(state: &AppState, user: &CurrentUser) -> Result<()> {
    let is_admin = ProfileRepository::new(state.pool())
        .is_admin(user.id)
        .await?;

    if is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You do not have permission to perform this action.".to_owned(),
        ))
    }
}
