//! Domain records for accounts and book reviews.
//!
//! Identifiers are opaque newtypes around [`Uuid`]. They are compared by value
//! for ownership checks and are never parsed for meaning.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Base URL of the avatar generator used for new accounts.
pub const AVATAR_BASE_URL: &str = "https://api.dicebear.com/9.x/avataaars/svg";

/// Lowest accepted review rating.
pub const MIN_RATING: u8 = 1;

/// Highest accepted review rating.
pub const MAX_RATING: u8 = 5;

// =============================================================================
// Identifiers
// =============================================================================

/// Store-assigned identifier of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

/// Store-assigned identifier of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewId(Uuid);

macro_rules! opaque_id {
    ($name:ident) => {
        impl $name {
            /// Generate a fresh random identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// The underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

opaque_id!(UserId);
opaque_id!(ReviewId);

// =============================================================================
// Users
// =============================================================================

/// A stored account, including its password hash.
///
/// Never serialized; use [`PublicUser`] for anything leaving the process.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub profile_image: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Projection without the password hash.
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            profile_image: self.profile_image.clone(),
        }
    }
}

/// Account fields safe to return to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub profile_image: String,
}

/// Fields required to create an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub profile_image: String,
}

/// Derive the avatar URL for a username.
///
/// Pure function of the username; the avatar service renders on demand.
pub fn avatar_url(username: &str) -> String {
    format!("{}?seed={}", AVATAR_BASE_URL, urlencoding::encode(username))
}

// =============================================================================
// Reviews
// =============================================================================

/// A stored book review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub title: String,
    pub caption: String,
    pub rating: u8,
    /// Durable URL of the cover image
    pub image: String,
    /// Handle for deleting the cover image from the host (absent on legacy records)
    #[serde(skip)]
    pub image_delete_handle: Option<String>,
    /// Owning user
    pub user: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub title: String,
    pub caption: String,
    pub rating: u8,
    pub image: String,
    pub image_delete_handle: Option<String>,
    pub user: UserId,
}

/// Author details joined into listed reviews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: UserId,
    pub username: String,
    pub profile_image: String,
}

/// A review with its author joined in place of the owner id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWithAuthor {
    pub id: ReviewId,
    pub title: String,
    pub caption: String,
    pub rating: u8,
    pub image: String,
    pub user: Author,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReviewWithAuthor {
    /// Join a review with its author.
    pub fn new(review: Review, author: Author) -> Self {
        Self {
            id: review.id,
            title: review.title,
            caption: review.caption,
            rating: review.rating,
            image: review.image,
            user: author,
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}
