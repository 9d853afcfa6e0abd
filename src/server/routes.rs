//! Router configuration for the Bookworm API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                 - Health check (public)
//! POST   /api/auth/register      - Create account (public)
//! POST   /api/auth/login         - Log in (public)
//! POST   /api/books              - Create review (bearer token)
//! GET    /api/books              - Page through reviews (bearer token)
//! GET    /api/books/user         - Caller's reviews (bearer token)
//! DELETE /api/books/{id}         - Delete own review (bearer token)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use bookworm::server::{create_router, AppState, RouterConfig};
//!
//! let router = create_router(state, RouterConfig::new());
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{Method, StatusCode};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::auth::auth_middleware;
use super::handlers::{health_handler, AppState, ErrorResponse};
use super::identity::{login_handler, register_handler};
use super::reviews::{
    create_review_handler, delete_review_handler, list_my_reviews_handler, list_reviews_handler,
};
use crate::config::{Config, DEFAULT_MAX_BODY_BYTES, DEFAULT_REQUEST_TIMEOUT_SECS};

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone, Debug)]
pub struct RouterConfig {
    /// Replace 5xx bodies with a generic message
    pub production: bool,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Per-request timeout; slower requests get 408
    pub request_timeout: Duration,

    /// Largest accepted request body
    pub max_body_bytes: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterConfig {
    /// Development defaults: any origin, detailed errors, tracing on.
    pub fn new() -> Self {
        Self {
            production: false,
            cors_origins: None,
            enable_tracing: true,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Derive router settings from the application config.
    ///
    /// Configured CORS origins only apply in production; development
    /// accepts any origin.
    pub fn from_config(config: &Config) -> Self {
        let router_config = Self::new()
            .with_production(config.is_production())
            .with_request_timeout(config.request_timeout())
            .with_max_body_bytes(config.max_body_bytes)
            .with_tracing(!config.no_tracing);

        match config.cors_origins {
            Some(ref origins) if config.is_production() => {
                router_config.with_cors_origins(origins.clone())
            }
            _ => router_config.with_cors_any_origin(),
        }
    }

    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    /// Restrict CORS to specific origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the application router.
pub fn create_router(state: AppState, config: RouterConfig) -> Router {
    // route_layer keeps the gate off unmatched paths so they still 404
    let protected_routes = Router::new()
        .route(
            "/api/books",
            post(create_review_handler).get(list_reviews_handler),
        )
        .route("/api/books/user", get(list_my_reviews_handler))
        .route("/api/books/{id}", delete(delete_review_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler));

    let router = Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_body_bytes));

    let router = if config.production {
        router.layer(middleware::map_response(redact_server_errors))
    } else {
        router
    };

    let router = router
        .layer(build_timeout_layer(&config))
        .layer(build_cors_layer(&config));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Replace the body of any 5xx response with a generic message.
async fn redact_server_errors(response: Response) -> Response {
    let status = response.status();
    if !status.is_server_error() {
        return response;
    }

    let body = ErrorResponse::with_status("internal_error", "Internal server error", status);
    (status, Json(body)).into_response()
}

fn build_timeout_layer(config: &RouterConfig) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, config.request_timeout)
}

fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
