//! Review creation, listing and deletion.
//!
//! # Endpoints
//!
//! All routes require a bearer token.
//!
//! - `POST /api/books` - Create a review, uploading its cover image
//! - `GET /api/books?page=&limit=` - Page through all reviews, newest first
//! - `GET /api/books/user` - Every review owned by the caller
//! - `DELETE /api/books/{id}` - Delete one of the caller's reviews

use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::image::ImageHost;
use crate::model::{NewReview, Review, ReviewId, ReviewWithAuthor, MAX_RATING, MIN_RATING};

use super::auth::AuthUser;
use super::handlers::{ApiJson, AppState, MessageResponse};
use super::pagination::Pagination;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Body of `POST /api/books`.
///
/// `rating` may arrive as a number or a numeric string.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateReviewRequest {
    pub title: Option<String>,
    pub caption: Option<String>,
    pub rating: Option<Value>,
    /// Inline image payload (data URL or base64)
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewResponse {
    pub success: bool,
    pub message: String,
    pub new_book: Review,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPage {
    pub books: Vec<ReviewWithAuthor>,
    pub current_page: u64,
    pub total_books: u64,
    pub total_pages: u64,
}

/// A validated create request.
#[derive(Debug, PartialEq, Eq)]
struct ReviewDraft {
    title: String,
    caption: String,
    rating: u8,
    image: String,
}

fn all_fields_required() -> ApiError {
    ApiError::Validation("All fields are required".to_string())
}

impl CreateReviewRequest {
    fn validate(self) -> Result<ReviewDraft, ApiError> {
        let title = self.title.filter(|v| !v.is_empty());
        let caption = self.caption.filter(|v| !v.is_empty());
        let image = self.image.filter(|v| !v.is_empty());
        let rating = self.rating.filter(|v| !is_blank(v));

        let (Some(title), Some(caption), Some(rating), Some(image)) =
            (title, caption, rating, image)
        else {
            return Err(all_fields_required());
        };

        Ok(ReviewDraft {
            title,
            caption,
            rating: parse_rating(&rating)?,
            image,
        })
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Coerce a rating to an integer in `MIN_RATING..=MAX_RATING`.
fn parse_rating(value: &Value) -> Result<u8, ApiError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole_number)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_number))
        }
        _ => None,
    };

    parsed
        .filter(|r| (i64::from(MIN_RATING)..=i64::from(MAX_RATING)).contains(r))
        .and_then(|r| u8::try_from(r).ok())
        .ok_or_else(|| {
            ApiError::Validation(format!(
                "Rating must be a whole number between {} and {}",
                MIN_RATING, MAX_RATING
            ))
        })
}

/// `4.0` is 4; `4.5`, NaN and infinities are not whole.
fn whole_number(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0).then_some(value as i64)
}

/// Delete an image, logging instead of failing.
async fn release_image(images: &dyn ImageHost, delete_handle: &str) {
    match images.destroy(delete_handle).await {
        Ok(()) => debug!(delete_handle = %delete_handle, "Deleted image"),
        Err(e) => warn!(delete_handle = %delete_handle, error = %e, "Failed to delete image"),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle review creation.
///
/// The image is uploaded before anything is stored; an upload failure
/// leaves no review behind. If storing fails after a successful upload,
/// the uploaded image is released.
///
/// # Response
///
/// `201 Created` with `{ "success": true, "message": ..., "newBook": { ... } }`.
pub async fn create_review_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<CreateReviewRequest>,
) -> Result<(StatusCode, Json<CreateReviewResponse>), ApiError> {
    let draft = body.validate()?;

    let uploaded = state.images.upload(&draft.image).await?;

    let inserted = state
        .reviews
        .insert_review(NewReview {
            title: draft.title,
            caption: draft.caption,
            rating: draft.rating,
            image: uploaded.url,
            image_delete_handle: Some(uploaded.delete_handle.clone()),
            user: user.id,
        })
        .await;

    let review = match inserted {
        Ok(review) => review,
        Err(e) => {
            release_image(state.images.as_ref(), &uploaded.delete_handle).await;
            return Err(e.into());
        }
    };

    info!(review_id = %review.id, user_id = %user.id, "Created review");

    Ok((
        StatusCode::CREATED,
        Json(CreateReviewResponse {
            success: true,
            message: "Book created successfully".to_string(),
            new_book: review,
        }),
    ))
}

/// Handle paginated review listing.
///
/// # Response
///
/// `200 OK` with `{ "books": [...], "currentPage", "totalBooks", "totalPages" }`.
pub async fn list_reviews_handler(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<ReviewPage>, ApiError> {
    let pagination = Pagination::from_query_string(query.as_deref());

    let books = state
        .reviews
        .list_reviews(pagination.skip(), pagination.limit())
        .await?;
    let total_books = state.reviews.count_reviews().await?;

    Ok(Json(ReviewPage {
        books,
        current_page: pagination.page(),
        total_books,
        total_pages: pagination.total_pages(total_books),
    }))
}

/// Handle listing of the caller's own reviews.
///
/// # Response
///
/// `200 OK` with a JSON array, newest first.
pub async fn list_my_reviews_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Review>>, ApiError> {
    let reviews = state.reviews.list_reviews_by_owner(user.id).await?;
    Ok(Json(reviews))
}

/// Handle review deletion.
///
/// Only the owner may delete a review. The cover image is deleted first on
/// a best-effort basis; a failure there is logged and the review is still
/// removed.
///
/// # Response
///
/// `200 OK` with `{ "message": "Book deleted successfully" }`.
pub async fn delete_review_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let not_found = || ApiError::NotFound("Book not found".to_string());

    let id: ReviewId = id.parse().map_err(|_| not_found())?;
    let review = state.reviews.find_review(id).await?.ok_or_else(not_found)?;

    if review.user != user.id {
        debug!(review_id = %id, user_id = %user.id, "Delete by non-owner");
        return Err(ApiError::Unauthorized);
    }

    match review.image_delete_handle.as_deref() {
        Some(handle) => release_image(state.images.as_ref(), handle).await,
        None => debug!(review_id = %id, "Review has no image handle"),
    }

    if !state.reviews.delete_review(id).await? {
        return Err(not_found());
    }

    info!(review_id = %id, user_id = %user.id, "Deleted review");

    Ok(Json(MessageResponse::new("Book deleted successfully")))
}
