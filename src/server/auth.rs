//! Bearer token authentication for protected routes.
//!
//! Protected requests must carry:
//!
//! ```text
//! Authorization: Bearer <token>
//! ```
//!
//! The gate verifies the token, loads the account it names, and attaches the
//! public projection of that account to the request. A missing header, a bad
//! signature, an expired token and a token naming a deleted account all get
//! the same 401 response.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::error::{ApiError, TokenError};
use crate::model::PublicUser;

use super::handlers::AppState;

/// Authorization scheme accepted by the gate.
const BEARER_SCHEME: &str = "Bearer";

// =============================================================================
// Authenticated Caller
// =============================================================================

/// The caller resolved by [`auth_middleware`].
///
/// Handlers mounted behind the gate take this as an extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub PublicUser);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(ApiError::Unauthenticated)
    }
}

// =============================================================================
// Header Parsing
// =============================================================================

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(ApiError::Unauthenticated)?
        .to_str()
        .map_err(|_| ApiError::Unauthenticated)?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(ApiError::Unauthenticated)?;

    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(ApiError::Unauthenticated);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(ApiError::Unauthenticated);
    }

    Ok(token)
}

// =============================================================================
// Axum Middleware
// =============================================================================

/// Authentication middleware for protected routes.
///
/// On success the resolved [`AuthUser`] is inserted into the request
/// extensions. The handler is never invoked on failure.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, middleware};
/// use bookworm::server::auth::auth_middleware;
///
/// let app = Router::new()
///     .route("/api/books", get(list_reviews_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = {
        let token = bearer_token(request.headers())?;
        state.tokens.verify(token).map_err(|e| {
            match &e {
                TokenError::Expired => debug!("Rejected expired token"),
                _ => debug!(error = %e, "Rejected token"),
            }
            ApiError::InvalidToken
        })?
    };

    let user = state
        .users
        .find_public_user(user_id)
        .await?
        .ok_or_else(|| {
            debug!(user_id = %user_id, "Token names an unknown user");
            ApiError::InvalidToken
        })?;

    request.extensions_mut().insert(AuthUser(user));

    Ok(next.run(request).await)
}

// =============================================================================
// Tests
// =============================================================================
