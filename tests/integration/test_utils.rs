//! Test utilities for integration tests.
//!
//! This module provides a scriptable image host, a store whose review side
//! always fails, and helpers for driving the router with JSON requests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tower::ServiceExt;

use bookworm::error::{ImageHostError, StoreError};
use bookworm::image::{ImageHost, UploadedImage};
use bookworm::model::{NewReview, Review, ReviewId, ReviewWithAuthor, UserId};
use bookworm::server::{create_router, AppState, RouterConfig};
use bookworm::store::{MemoryStore, ReviewStore, Stores};
use bookworm::TokenService;

pub const TEST_SECRET: &str = "integration-test-secret";

pub const TEST_IMAGE: &str = "data:image/png;base64,iVBORw0KGgo=";

// =============================================================================
// Mock Image Host
// =============================================================================

/// An image host that records calls and can be told to fail.
#[derive(Default)]
pub struct MockImageHost {
    uploads: AtomicUsize,
    destroyed: RwLock<Vec<String>>,
    fail_uploads: AtomicBool,
    fail_destroys: AtomicBool,
}

impl MockImageHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_destroys(&self, fail: bool) {
        self.fail_destroys.store(fail, Ordering::SeqCst);
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    /// Handles passed to `destroy`, including failed attempts.
    pub async fn destroyed(&self) -> Vec<String> {
        self.destroyed.read().await.clone()
    }
}

#[async_trait]
impl ImageHost for MockImageHost {
    async fn upload(&self, _payload: &str) -> Result<UploadedImage, ImageHostError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(ImageHostError::Rejected {
                status: 500,
                message: "upload rejected".to_string(),
            });
        }

        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(UploadedImage {
            url: format!("https://img.test/covers/{}.png", n),
            delete_handle: format!("covers/{}", n),
        })
    }

    async fn destroy(&self, delete_handle: &str) -> Result<(), ImageHostError> {
        self.destroyed.write().await.push(delete_handle.to_string());

        if self.fail_destroys.load(Ordering::SeqCst) {
            return Err(ImageHostError::Connection("image host down".to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// Failing Review Store
// =============================================================================

/// A review store where every call fails.
pub struct FailingReviewStore;

#[async_trait]
impl ReviewStore for FailingReviewStore {
    async fn insert_review(&self, _review: NewReview) -> Result<Review, StoreError> {
        Err(StoreError::Query("insert exploded".to_string()))
    }

    async fn find_review(&self, _id: ReviewId) -> Result<Option<Review>, StoreError> {
        Err(StoreError::Query("find exploded".to_string()))
    }

    async fn list_reviews(
        &self,
        _skip: u64,
        _limit: u64,
    ) -> Result<Vec<ReviewWithAuthor>, StoreError> {
        Err(StoreError::Query("list exploded".to_string()))
    }

    async fn count_reviews(&self) -> Result<u64, StoreError> {
        Err(StoreError::Query("count exploded".to_string()))
    }

    async fn list_reviews_by_owner(&self, _owner: UserId) -> Result<Vec<Review>, StoreError> {
        Err(StoreError::Query("list exploded".to_string()))
    }

    async fn delete_review(&self, _id: ReviewId) -> Result<bool, StoreError> {
        Err(StoreError::Query("delete exploded".to_string()))
    }
}

// =============================================================================
// Test Application
// =============================================================================

/// A router wired to in-memory collaborators.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub images: Arc<MockImageHost>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(RouterConfig::new().with_tracing(false))
    }

    pub fn with_config(config: RouterConfig) -> Self {
        Self::with_stores(Stores::from_backend(MemoryStore::new()), config)
    }

    /// Real credential store, failing review store.
    pub fn with_failing_reviews(config: RouterConfig) -> Self {
        let mut stores = Stores::from_backend(MemoryStore::new());
        stores.reviews = Arc::new(FailingReviewStore);
        Self::with_stores(stores, config)
    }

    fn with_stores(stores: Stores, config: RouterConfig) -> Self {
        let images = Arc::new(MockImageHost::new());
        let state = AppState::new(stores, images.clone(), TokenService::new(TEST_SECRET));
        let router = create_router(state.clone(), config);
        Self {
            router,
            state,
            images,
        }
    }

    /// Send a request and decode the JSON body (Null if empty or not JSON).
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    /// Register an account and return its token and public user.
    pub async fn register(&self, username: &str, email: &str) -> (String, Value) {
        let (status, body) = self
            .send(json_request(
                Method::POST,
                "/api/auth/register",
                None,
                json!({ "username": username, "email": email, "password": "secret123" }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        let token = body["token"].as_str().unwrap().to_string();
        (token, body["user"].clone())
    }

    /// Create a review and return the stored record.
    pub async fn create_review(&self, token: &str, title: &str) -> Value {
        let (status, body) = self
            .send(json_request(
                Method::POST,
                "/api/books",
                Some(token),
                review_body(title, json!(4)),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
        body["newBook"].clone()
    }
}

// =============================================================================
// Request Builders
// =============================================================================

pub fn review_body(title: &str, rating: Value) -> Value {
    json!({
        "title": title,
        "caption": format!("Thoughts on {}", title),
        "rating": rating,
        "image": TEST_IMAGE,
    })
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}
