//! HTTP server layer for Bookworm.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │              /api/auth/*            /api/books/*                │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  identity   │  │   reviews   │  │        routes           │  │
//! │  │ (accounts)  │  │  (catalog)  │  │  (router config)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │    auth     │  │  handlers   │  │      pagination         │  │
//! │  │(bearer gate)│  │(state/errs) │  │   (page windows)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod handlers;
pub mod identity;
pub mod pagination;
pub mod reviews;
pub mod routes;

pub use auth::{auth_middleware, bearer_token, AuthUser};
pub use handlers::{
    health_handler, ApiJson, AppState, ErrorResponse, HealthResponse, MessageResponse,
};
pub use identity::{login_handler, register_handler, AuthResponse, LoginRequest, RegisterRequest};
pub use pagination::{Pagination, DEFAULT_LIMIT, DEFAULT_PAGE};
pub use reviews::{
    create_review_handler, delete_review_handler, list_my_reviews_handler, list_reviews_handler,
    CreateReviewRequest, CreateReviewResponse, ReviewPage,
};
pub use routes::{create_router, RouterConfig};
