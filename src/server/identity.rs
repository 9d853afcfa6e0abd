//! Account registration and login.
//!
//! # Endpoints
//!
//! - `POST /api/auth/register` - Create an account and return a token
//! - `POST /api/auth/login` - Exchange credentials for a token

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::identity::password::{
    burn_verify_blocking, hash_password_blocking, verify_password_blocking,
};
use crate::model::{avatar_url, NewUser, PublicUser};

use super::handlers::{ApiJson, AppState};

/// Shortest accepted password, in characters.
pub const MIN_PASSWORD_CHARS: usize = 6;

/// Shortest accepted username, in characters.
pub const MIN_USERNAME_CHARS: usize = 3;

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Token plus the account it was issued for.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Treat absent and empty fields alike.
fn present(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle account registration.
///
/// Checks run in a fixed order and the first failure wins: all fields
/// present, password length, username length, username free, email free.
///
/// # Response
///
/// `201 Created` with `{ "token": ..., "user": { ... } }`.
pub async fn register_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let (Some(email), Some(username), Some(password)) = (
        present(body.email),
        present(body.username),
        present(body.password),
    ) else {
        return Err(ApiError::Validation("All fields are required".to_string()));
    };

    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::Validation(format!(
            "Password should be at least {} characters long",
            MIN_PASSWORD_CHARS
        )));
    }

    if username.chars().count() < MIN_USERNAME_CHARS {
        return Err(ApiError::Validation(format!(
            "Username should be at least {} characters long",
            MIN_USERNAME_CHARS
        )));
    }

    if state.users.username_exists(&username).await? {
        return Err(ApiError::Conflict(
            "Username already exists, please login instead".to_string(),
        ));
    }

    if state.users.email_exists(&email).await? {
        return Err(ApiError::Conflict(
            "User with this email already exists, please login instead".to_string(),
        ));
    }

    let password_hash = hash_password_blocking(password).await?;
    let profile_image = avatar_url(&username);

    // The store re-checks uniqueness, so a concurrent duplicate still maps to Conflict
    let user = state
        .users
        .insert_user(NewUser {
            username,
            email,
            password_hash,
            profile_image,
        })
        .await?;

    let token = state
        .tokens
        .issue(user.id)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!(user_id = %user.id, username = %user.username, "Registered user");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.to_public(),
        }),
    ))
}

/// Handle login.
///
/// An unknown email and a wrong password produce the same response, and
/// both pay for one Argon2 verification.
///
/// # Response
///
/// `200 OK` with `{ "token": ..., "user": { ... } }`.
pub async fn login_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (Some(email), Some(password)) = (present(body.email), present(body.password)) else {
        return Err(ApiError::Validation("All fields are required".to_string()));
    };

    let Some(user) = state.users.find_user_by_email(&email).await? else {
        burn_verify_blocking(password).await;
        debug!("Login for unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password_blocking(password, user.password_hash.clone()).await? {
        debug!(user_id = %user.id, "Login with wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = state
        .tokens
        .issue(user.id)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    debug!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        token,
        user: user.to_public(),
    }))
}
