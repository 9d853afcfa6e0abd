//! In-memory store for development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{StoreError, UniqueField};
use crate::model::{
    Author, NewReview, NewUser, PublicUser, Review, ReviewId, ReviewWithAuthor, User, UserId,
};

use super::{ReviewStore, UserStore};

/// Process-local implementation of both stores.
///
/// Reviews are kept in insertion order and creation timestamps never go
/// backwards, so "newest first" is simply reverse insertion order.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, User>,
    reviews: Vec<Review>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    pub async fn user_count(&self) -> usize {
        self.inner.read().await.users.len()
    }
}

impl Inner {
    fn author(&self, id: UserId) -> Option<Author> {
        self.users.get(&id).map(|user| Author {
            id: user.id,
            username: user.username.clone(),
            profile_image: user.profile_image.clone(),
        })
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate(UniqueField::Username));
        }
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(UniqueField::Email));
        }

        let stored = User {
            id: UserId::generate(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            profile_image: user.profile_image,
            created_at: Utc::now(),
        };
        inner.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_public_user(&self, id: UserId) -> Result<Option<PublicUser>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).map(User::to_public))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().any(|u| u.username == username))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().any(|u| u.email == email))
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn insert_review(&self, review: NewReview) -> Result<Review, StoreError> {
        let mut inner = self.inner.write().await;

        let now = Utc::now();
        let created_at = match inner.reviews.last() {
            Some(last) if last.created_at > now => last.created_at,
            _ => now,
        };

        let stored = Review {
            id: ReviewId::generate(),
            title: review.title,
            caption: review.caption,
            rating: review.rating,
            image: review.image,
            image_delete_handle: review.image_delete_handle,
            user: review.user,
            created_at,
            updated_at: created_at,
        };
        inner.reviews.push(stored.clone());
        Ok(stored)
    }

    async fn find_review(&self, id: ReviewId) -> Result<Option<Review>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.reviews.iter().find(|r| r.id == id).cloned())
    }

    async fn list_reviews(
        &self,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<ReviewWithAuthor>, StoreError> {
        let inner = self.inner.read().await;
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        inner
            .reviews
            .iter()
            .rev()
            .skip(skip)
            .take(limit)
            .map(|review| -> Result<ReviewWithAuthor, StoreError> {
                let author = inner.author(review.user).ok_or_else(|| {
                    StoreError::Corrupt(format!("review {} has no owner", review.id))
                })?;
                Ok(ReviewWithAuthor::new(review.clone(), author))
            })
            .collect()
    }

    async fn count_reviews(&self) -> Result<u64, StoreError> {
        Ok(self.inner.read().await.reviews.len() as u64)
    }

    async fn list_reviews_by_owner(&self, owner: UserId) -> Result<Vec<Review>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .reviews
            .iter()
            .rev()
            .filter(|r| r.user == owner)
            .cloned()
            .collect())
    }

    async fn delete_review(&self, id: ReviewId) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.reviews.len();
        inner.reviews.retain(|r| r.id != id);
        Ok(inner.reviews.len() != before)
    }
}
