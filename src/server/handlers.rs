//! Shared HTTP plumbing for the Bookworm API.
//!
//! This module holds the application state handed to every handler, the JSON
//! error envelope, the mapping from [`ApiError`] to HTTP responses, and the
//! health check.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::ApiError;
use crate::identity::TokenService;
use crate::image::ImageHost;
use crate::store::{ReviewStore, Stores, UserStore};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
///
/// Every collaborator is passed in explicitly; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Credential store
    pub users: Arc<dyn UserStore>,

    /// Review store
    pub reviews: Arc<dyn ReviewStore>,

    /// Cover image host
    pub images: Arc<dyn ImageHost>,

    /// Bearer token issuer/verifier
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(stores: Stores, images: Arc<dyn ImageHost>, tokens: TokenService) -> Self {
        Self {
            users: stores.users,
            reviews: stores.reviews,
            images,
            tokens,
        }
    }
}

// =============================================================================
// Request Extraction
// =============================================================================

/// JSON body extractor whose rejections use the API error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge(rejection.body_text());
        }
        ApiError::Validation(rejection.body_text())
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "validation_error")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            status: Some(status.as_u16()),
            ..Self::new(error, message)
        }
    }
}

/// Plain confirmation body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

impl ApiError {
    /// HTTP status and error type identifier for this error.
    pub fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            ApiError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            ApiError::Conflict(_) => (StatusCode::BAD_REQUEST, "conflict"),
            ApiError::InvalidCredentials => (StatusCode::BAD_REQUEST, "invalid_credentials"),
            // Gate failures share one shape so callers cannot tell them apart
            ApiError::Unauthenticated | ApiError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "invalid_token")
            }
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

/// Convert ApiError to HTTP response.
///
/// - 5xx errors are logged at ERROR level
/// - 401 and 404 at DEBUG (routine)
/// - other 4xx at WARN
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_type();
        let message = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Request rejected: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);
        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
