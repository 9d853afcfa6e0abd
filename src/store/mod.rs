//! Persistence seams for accounts and reviews.
//!
//! Handlers talk to the stores only through the [`UserStore`] and
//! [`ReviewStore`] traits, so backends can be swapped without touching the
//! HTTP layer:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └───────────┬─────────────────┬───────────┘
//!             │                 │
//!             ▼                 ▼
//!      ┌────────────┐    ┌─────────────┐
//!      │ UserStore  │    │ ReviewStore │
//!      └─────┬──────┘    └──────┬──────┘
//!            └────────┬─────────┘
//!          ┌──────────┴───────────┐
//!          ▼                      ▼
//! ┌─────────────────┐    ┌─────────────────┐
//! │  MemoryStore    │    │    PgStore      │
//! │ (dev / tests)   │    │  (PostgreSQL)   │
//! └─────────────────┘    └─────────────────┘
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{NewReview, NewUser, PublicUser, Review, ReviewId, ReviewWithAuthor, User, UserId};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// URL scheme that selects the in-memory backend.
pub const MEMORY_STORE_URL: &str = "memory://";

/// Credential store.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new account.
    ///
    /// Fails with [`StoreError::Duplicate`] if the username or email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Look up an account by id, without its password hash.
    async fn find_public_user(&self, id: UserId) -> Result<Option<PublicUser>, StoreError>;

    /// Look up an account by email, including its password hash.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError>;

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError>;
}

/// Review store.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Persist a new review, assigning its id and timestamps.
    async fn insert_review(&self, review: NewReview) -> Result<Review, StoreError>;

    async fn find_review(&self, id: ReviewId) -> Result<Option<Review>, StoreError>;

    /// One page of all reviews, newest first, with authors joined.
    async fn list_reviews(&self, skip: u64, limit: u64)
        -> Result<Vec<ReviewWithAuthor>, StoreError>;

    /// Total number of reviews.
    async fn count_reviews(&self) -> Result<u64, StoreError>;

    /// Every review owned by `owner`, newest first.
    async fn list_reviews_by_owner(&self, owner: UserId) -> Result<Vec<Review>, StoreError>;

    /// Remove a review. Returns `false` if it did not exist.
    async fn delete_review(&self, id: ReviewId) -> Result<bool, StoreError>;
}

/// Both stores behind one connection.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub reviews: Arc<dyn ReviewStore>,
}

impl Stores {
    /// Share one backend for both seams.
    pub fn from_backend<B>(backend: B) -> Self
    where
        B: UserStore + ReviewStore + 'static,
    {
        let backend = Arc::new(backend);
        Self {
            users: backend.clone(),
            reviews: backend,
        }
    }

    /// Open the backend named by `database_url`.
    ///
    /// `memory://` selects [`MemoryStore`]; anything else is treated as a
    /// PostgreSQL connection string and the schema is created if missing.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        if database_url.starts_with(MEMORY_STORE_URL) {
            return Ok(Self::from_backend(MemoryStore::new()));
        }

        let store = PgStore::connect(database_url).await?;
        store.migrate().await?;
        Ok(Self::from_backend(store))
    }
}
