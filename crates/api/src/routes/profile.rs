//! Profile route handlers.
//!
//! A user can only ever see or create their own profile; there is no
//! endpoint to read anyone else's.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use forno_core::ProfileId;

use crate::db::profiles::ProfileRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::UserSummary;
use crate::state::AppState;

/// Profile response body, with the owner embedded.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: ProfileId,
    pub user: UserSummary,
    pub phone: String,
    pub default_address: String,
    pub is_admin: bool,
}

/// Profile creation request body.
#[derive(Debug, Deserialize)]
pub struct CreateProfileRequest {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub default_address: String,
}

/// Get the caller's own profile.
///
/// # Errors
///
/// Returns 404 when no profile has been created yet.
#[instrument(skip(state), fields(user = %user.username))]
pub async fn show(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>> {
    let profile = ProfileRepository::new(state.pool())
        .find_by_user(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("profile".to_owned()))?;

    Ok(Json(ProfileResponse {
        id: profile.id,
        user: UserSummary::from(&user),
        phone: profile.phone,
        default_address: profile.default_address,
        is_admin: profile.is_admin,
    }))
}

/// Create the caller's profile.
///
/// The admin flag always starts false; it is never client-settable.
///
/// # Errors
///
/// Returns 400 when the caller already has a profile.
#[instrument(skip(state, body), fields(user = %user.username))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<ProfileResponse>)> {
    let profile = ProfileRepository::new(state.pool())
        .create(user.id, &body.phone, &body.default_address)
        .await?;

    tracing::info!(profile_id = %profile.id, "Profile created");

    Ok((
        StatusCode::CREATED,
        Json(ProfileResponse {
            id: profile.id,
            user: UserSummary::from(&user),
            phone: profile.phone,
            default_address: profile.default_address,
            is_admin: profile.is_admin,
        }),
    ))
}
