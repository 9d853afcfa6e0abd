//! # Bookworm
//!
//! Backend for a book-review catalog.
//!
//! Readers register or log in to receive a bearer token, then post short
//! reviews of books (title, caption, 1-5 star rating, cover image), page
//! through everyone's reviews newest first, list their own, and delete
//! reviews they own.
//!
//! ## Features
//!
//! - **Bearer-token auth**: HS256 tokens valid for 15 days, Argon2 password hashes
//! - **Pluggable storage**: PostgreSQL via sqlx, or an in-memory store for development
//! - **Hosted cover images**: Cloudinary uploads, with best-effort cleanup on delete
//! - **Keep-alive**: Optional periodic self-ping for hosts that idle quiet processes
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`model`] - Accounts, reviews and their identifiers
//! - [`identity`] - Token issuing/verification and password hashing
//! - [`store`] - Credential and review store traits with backends
//! - [`image`] - Image host trait with Cloudinary and in-memory backends
//! - [`server`] - Axum-based HTTP server and routes
//! - [`keepalive`] - Background self-ping
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use bookworm::{create_router, AppState, MemoryImageHost, RouterConfig, Stores, TokenService};
//!
//! #[tokio::main]
//! async fn main() {
//!     let stores = Stores::connect("memory://").await.unwrap();
//!     let state = AppState::new(
//!         stores,
//!         Arc::new(MemoryImageHost::new()),
//!         TokenService::new("change-me"),
//!     );
//!
//!     let router = create_router(state, RouterConfig::new());
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod identity;
pub mod image;
pub mod keepalive;
pub mod model;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use config::{Config, Environment};
pub use error::{ApiError, ImageHostError, PasswordError, StoreError, TokenError, UniqueField};
pub use identity::{hash_password, verify_password, TokenService, TOKEN_TTL};
pub use image::{
    CloudinaryConfig, CloudinaryHost, ImageHost, MemoryImageHost, UploadedImage,
    CLOUDINARY_API_BASE,
};
pub use keepalive::KeepAlive;
pub use model::{
    avatar_url, Author, NewReview, NewUser, PublicUser, Review, ReviewId, ReviewWithAuthor, User,
    UserId,
};
pub use server::{
    auth_middleware, create_router, health_handler, ApiJson, AppState, AuthUser, ErrorResponse,
    HealthResponse, Pagination, RouterConfig,
};
pub use store::{MemoryStore, PgStore, ReviewStore, Stores, UserStore, MEMORY_STORE_URL};
