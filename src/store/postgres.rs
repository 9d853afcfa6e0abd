//! PostgreSQL-backed store.
//!
//! Uses runtime-checked `sqlx` queries so the crate builds without a live
//! database. The schema is created on start-up if it does not exist.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{StoreError, UniqueField};
use crate::model::{
    Author, NewReview, NewUser, PublicUser, Review, ReviewId, ReviewWithAuthor, User, UserId,
};

use super::{ReviewStore, UserStore};

/// Maximum pooled connections.
const MAX_CONNECTIONS: u32 = 10;

/// How long to wait for a pooled connection before failing the request.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Postgres error code for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id            UUID PRIMARY KEY,
        username      TEXT NOT NULL UNIQUE,
        email         TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        profile_image TEXT NOT NULL,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reviews (
        id                  UUID PRIMARY KEY,
        title               TEXT NOT NULL,
        caption             TEXT NOT NULL,
        rating              SMALLINT NOT NULL CHECK (rating BETWEEN 1 AND 5),
        image               TEXT NOT NULL,
        image_delete_handle TEXT,
        user_id             UUID NOT NULL REFERENCES users (id),
        created_at          TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp(),
        updated_at          TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS reviews_created_at_idx ON reviews (created_at DESC)",
    "CREATE INDEX IF NOT EXISTS reviews_user_created_at_idx ON reviews (user_id, created_at DESC)",
];

// =============================================================================
// Row types
// =============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    profile_image: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::from_uuid(row.id),
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            profile_image: row.profile_image,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    title: String,
    caption: String,
    rating: i16,
    image: String,
    image_delete_handle: Option<String>,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = StoreError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = u8::try_from(row.rating)
            .map_err(|_| StoreError::Corrupt(format!("review {} rating {}", row.id, row.rating)))?;

        Ok(Review {
            id: ReviewId::from_uuid(row.id),
            title: row.title,
            caption: row.caption,
            rating,
            image: row.image,
            image_delete_handle: row.image_delete_handle,
            user: UserId::from_uuid(row.user_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReviewAuthorRow {
    #[sqlx(flatten)]
    review: ReviewRow,
    author_username: String,
    author_profile_image: String,
}

impl TryFrom<ReviewAuthorRow> for ReviewWithAuthor {
    type Error = StoreError;

    fn try_from(row: ReviewAuthorRow) -> Result<Self, Self::Error> {
        let review = Review::try_from(row.review)?;
        let author = Author {
            id: review.user,
            username: row.author_username,
            profile_image: row.author_profile_image,
        };
        Ok(ReviewWithAuthor::new(review, author))
    }
}

// =============================================================================
// Error mapping
// =============================================================================

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            let field = match db_err.constraint() {
                Some(constraint) if constraint.contains("email") => UniqueField::Email,
                _ => UniqueField::Username,
            };
            StoreError::Duplicate(field)
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Connection(err.to_string()),
        _ => StoreError::Query(err.to_string()),
    }
}

// =============================================================================
// PgStore
// =============================================================================

/// PostgreSQL implementation of both stores.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and verify the connection with a round trip.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create tables and indexes if they do not exist.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        }
        debug!("Schema is up to date");
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, username, email, password_hash, profile_image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, password_hash, profile_image, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.profile_image)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_public_user(&self, id: UserId) -> Result<Option<PublicUser>, StoreError> {
        let row = sqlx::query_as::<_, (Uuid, String, String, String)>(
            "SELECT id, username, email, profile_image FROM users WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|(id, username, email, profile_image)| PublicUser {
            id: UserId::from_uuid(id),
            username,
            email,
            profile_image,
        }))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, profile_image, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(User::from))
    }

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn insert_review(&self, review: NewReview) -> Result<Review, StoreError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            INSERT INTO reviews (id, title, caption, rating, image, image_delete_handle, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, title, caption, rating, image, image_delete_handle, user_id,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&review.title)
        .bind(&review.caption)
        .bind(i16::from(review.rating))
        .bind(&review.image)
        .bind(&review.image_delete_handle)
        .bind(review.user.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.try_into()
    }

    async fn find_review(&self, id: ReviewId) -> Result<Option<Review>, StoreError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT id, title, caption, rating, image, image_delete_handle, user_id,
                   created_at, updated_at
            FROM reviews
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(Review::try_from).transpose()
    }

    async fn list_reviews(
        &self,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<ReviewWithAuthor>, StoreError> {
        let rows = sqlx::query_as::<_, ReviewAuthorRow>(
            r#"
            SELECT r.id, r.title, r.caption, r.rating, r.image, r.image_delete_handle,
                   r.user_id, r.created_at, r.updated_at,
                   u.username AS author_username,
                   u.profile_image AS author_profile_image
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            ORDER BY r.created_at DESC, r.id DESC
            OFFSET $1
            LIMIT $2
            "#,
        )
        .bind(i64::try_from(skip).unwrap_or(i64::MAX))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(ReviewWithAuthor::try_from).collect()
    }

    async fn count_reviews(&self) -> Result<u64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reviews")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        u64::try_from(count).map_err(|_| StoreError::Corrupt(format!("review count {}", count)))
    }

    async fn list_reviews_by_owner(&self, owner: UserId) -> Result<Vec<Review>, StoreError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT id, title, caption, rating, image, image_delete_handle, user_id,
                   created_at, updated_at
            FROM reviews
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(Review::try_from).collect()
    }

    async fn delete_review(&self, id: ReviewId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
