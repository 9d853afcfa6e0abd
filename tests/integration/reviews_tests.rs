//! Review endpoint integration tests.
//!
//! Tests verify:
//! - Creation validates input and uploads the image before storing
//! - Listing pages newest first with authors joined
//! - Owners see only their own reviews
//! - Deletion enforces ownership and cleans up images best-effort

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use bookworm::model::{NewReview, UserId};
use bookworm::server::RouterConfig;

use super::test_utils::{empty_request, json_request, review_body, TestApp, TEST_IMAGE};

async fn create(app: &TestApp, token: &str, body: Value) -> (StatusCode, Value) {
    app.send(json_request(Method::POST, "/api/books", Some(token), body))
        .await
}

async fn list(app: &TestApp, token: &str, query: &str) -> Value {
    let (status, body) = app
        .send(empty_request(
            Method::GET,
            &format!("/api/books{}", query),
            Some(token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    body
}

async fn delete(app: &TestApp, token: &str, id: &str) -> (StatusCode, Value) {
    app.send(empty_request(
        Method::DELETE,
        &format!("/api/books/{}", id),
        Some(token),
    ))
    .await
}

fn titles(books: &Value) -> Vec<String> {
    books
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap().to_string())
        .collect()
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_create_review() {
    let app = TestApp::new();
    let (token, user) = app.register("reader", "reader@example.com").await;

    let (status, body) = create(&app, &token, review_body("Dune", json!(5))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Book created successfully");

    let book = &body["newBook"];
    assert_eq!(book["title"], "Dune");
    assert_eq!(book["rating"], 5);
    assert_eq!(book["user"], user["id"]);
    assert_eq!(book["image"], "https://img.test/covers/1.png");
    assert!(book["createdAt"].is_string());
    assert!(book.get("imageDeleteHandle").is_none());
    assert_eq!(app.images.upload_count(), 1);
}

#[tokio::test]
async fn test_create_accepts_numeric_string_rating() {
    let app = TestApp::new();
    let (token, _) = app.register("reader", "reader@example.com").await;

    let (status, body) = create(&app, &token, review_body("Dune", json!("3"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["newBook"]["rating"], 3);
}

#[tokio::test]
async fn test_create_accepts_every_valid_rating() {
    let app = TestApp::new();
    let (token, _) = app.register("reader", "reader@example.com").await;

    for (rating, stored) in [
        (json!(1), 1),
        (json!(3), 3),
        (json!(5), 5),
        (json!("4"), 4),
        (json!(4.0), 4),
        (json!("2.0"), 2),
    ] {
        let (status, body) = create(&app, &token, review_body("Dune", rating)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["newBook"]["rating"], stored);
    }
}

#[tokio::test]
async fn test_create_missing_field_uploads_nothing() {
    let app = TestApp::new();
    let (token, _) = app.register("reader", "reader@example.com").await;

    let (status, body) = create(
        &app,
        &token,
        json!({ "title": "Dune", "rating": 4, "image": TEST_IMAGE }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "All fields are required");
    assert_eq!(app.images.upload_count(), 0);
}

#[tokio::test]
async fn test_create_rejects_bad_ratings() {
    let app = TestApp::new();
    let (token, _) = app.register("reader", "reader@example.com").await;

    for rating in [json!(0), json!(6), json!("abc"), json!(2.5), Value::Null] {
        let (status, body) = create(&app, &token, review_body("Dune", rating.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "rating {}", rating);
        assert_eq!(body["error"], "validation_error");
    }

    assert_eq!(app.images.upload_count(), 0);
    assert_eq!(list(&app, &token, "").await["totalBooks"], 0);
}

#[tokio::test]
async fn test_upload_failure_stores_nothing() {
    let app = TestApp::new();
    let (token, _) = app.register("reader", "reader@example.com").await;
    app.images.fail_uploads(true);

    let (status, body) = create(&app, &token, review_body("Dune", json!(5))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "upstream_error");
    assert_eq!(list(&app, &token, "").await["totalBooks"], 0);
}

#[tokio::test]
async fn test_store_failure_releases_uploaded_image() {
    let app = TestApp::with_failing_reviews(RouterConfig::new().with_tracing(false));
    let (token, _) = app.register("reader", "reader@example.com").await;

    let (status, _) = create(&app, &token, review_body("Dune", json!(5))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.images.upload_count(), 1);
    assert_eq!(app.images.destroyed().await, vec!["covers/1".to_string()]);
}

// =============================================================================
// List
// =============================================================================

#[tokio::test]
async fn test_list_pages_newest_first() {
    let app = TestApp::new();
    let (token, _) = app.register("reader", "reader@example.com").await;

    for n in 1..=7 {
        app.create_review(&token, &format!("Book {}", n)).await;
    }

    let page1 = list(&app, &token, "").await;
    assert_eq!(page1["currentPage"], 1);
    assert_eq!(page1["totalBooks"], 7);
    assert_eq!(page1["totalPages"], 2);
    assert_eq!(
        titles(&page1["books"]),
        vec!["Book 7", "Book 6", "Book 5", "Book 4", "Book 3"]
    );

    let page2 = list(&app, &token, "?page=2").await;
    assert_eq!(page2["currentPage"], 2);
    assert_eq!(titles(&page2["books"]), vec!["Book 2", "Book 1"]);

    let page3 = list(&app, &token, "?page=3").await;
    assert_eq!(page3["books"], json!([]));
    assert_eq!(page3["totalBooks"], 7);
}

#[tokio::test]
async fn test_twelve_reviews_in_pages_of_five() {
    let app = TestApp::new();
    let (token, _) = app.register("reader", "reader@example.com").await;
    for n in 1..=12 {
        app.create_review(&token, &format!("Book {}", n)).await;
    }

    let counts = [(1, 5), (2, 5), (3, 2), (4, 0)];
    for (page, expected) in counts {
        let body = list(&app, &token, &format!("?page={}&limit=5", page)).await;
        assert_eq!(body["books"].as_array().unwrap().len(), expected, "page {}", page);
        assert_eq!(body["totalPages"], 3);
        assert_eq!(body["totalBooks"], 12);
    }
}

#[tokio::test]
async fn test_list_custom_limit() {
    let app = TestApp::new();
    let (token, _) = app.register("reader", "reader@example.com").await;
    for n in 1..=3 {
        app.create_review(&token, &format!("Book {}", n)).await;
    }

    let page = list(&app, &token, "?page=2&limit=2").await;
    assert_eq!(page["totalPages"], 2);
    assert_eq!(titles(&page["books"]), vec!["Book 1"]);
}

#[tokio::test]
async fn test_list_garbage_params_use_defaults() {
    let app = TestApp::new();
    let (token, _) = app.register("reader", "reader@example.com").await;
    app.create_review(&token, "Dune").await;

    let page = list(&app, &token, "?page=abc&limit=-4").await;
    assert_eq!(page["currentPage"], 1);
    assert_eq!(page["totalPages"], 1);
    assert_eq!(titles(&page["books"]), vec!["Dune"]);
}

#[tokio::test]
async fn test_list_repeated_params_keep_first() {
    let app = TestApp::new();
    let (token, _) = app.register("reader", "reader@example.com").await;
    for n in 1..=3 {
        app.create_review(&token, &format!("Book {}", n)).await;
    }

    let page = list(&app, &token, "?page=1&page=2").await;
    assert_eq!(page["currentPage"], 1);
    assert_eq!(page["totalBooks"], 3);

    let page = list(&app, &token, "?page=2&page=1&limit=2&limit=9").await;
    assert_eq!(page["currentPage"], 2);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(titles(&page["books"]), vec!["Book 1"]);
}

#[tokio::test]
async fn test_list_empty_catalog() {
    let app = TestApp::new();
    let (token, _) = app.register("reader", "reader@example.com").await;

    let page = list(&app, &token, "").await;
    assert_eq!(
        page,
        json!({ "books": [], "currentPage": 1, "totalBooks": 0, "totalPages": 0 })
    );
}

#[tokio::test]
async fn test_list_joins_author() {
    let app = TestApp::new();
    let (token, user) = app.register("reader", "reader@example.com").await;
    app.create_review(&token, "Dune").await;

    let page = list(&app, &token, "").await;
    let author = &page["books"][0]["user"];
    assert_eq!(author["id"], user["id"]);
    assert_eq!(author["username"], "reader");
    assert_eq!(author["profileImage"], user["profileImage"]);
    assert!(author.get("email").is_none());
}

// =============================================================================
// List Mine
// =============================================================================

#[tokio::test]
async fn test_list_mine_only_returns_own_reviews() {
    let app = TestApp::new();
    let (alice, alice_user) = app.register("alice", "alice@example.com").await;
    let (bob, _) = app.register("bob", "bob@example.com").await;

    app.create_review(&alice, "Alice 1").await;
    app.create_review(&bob, "Bob 1").await;
    app.create_review(&alice, "Alice 2").await;

    let (status, body) = app
        .send(empty_request(Method::GET, "/api/books/user", Some(&alice)))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&body), vec!["Alice 2", "Alice 1"]);
    for book in body.as_array().unwrap() {
        assert_eq!(book["user"], alice_user["id"]);
    }
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_owner_deletes_review_and_image() {
    let app = TestApp::new();
    let (token, _) = app.register("reader", "reader@example.com").await;
    let book = app.create_review(&token, "Dune").await;
    let id = book["id"].as_str().unwrap();

    let (status, body) = delete(&app, &token, id).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Book deleted successfully");
    assert_eq!(app.images.destroyed().await, vec!["covers/1".to_string()]);
    assert_eq!(list(&app, &token, "").await["totalBooks"], 0);

    // Already gone
    let (status, body) = delete(&app, &token, id).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Book not found");
}

#[tokio::test]
async fn test_non_owner_cannot_delete() {
    let app = TestApp::new();
    let (alice, _) = app.register("alice", "alice@example.com").await;
    let (bob, _) = app.register("bob", "bob@example.com").await;
    let book = app.create_review(&alice, "Dune").await;

    let (status, body) = delete(&app, &bob, book["id"].as_str().unwrap()).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
    assert_eq!(body["message"], "Unauthorized");
    assert!(app.images.destroyed().await.is_empty());
    assert_eq!(list(&app, &alice, "").await["totalBooks"], 1);
}

#[tokio::test]
async fn test_delete_unknown_and_malformed_ids() {
    let app = TestApp::new();
    let (token, _) = app.register("reader", "reader@example.com").await;

    let (status, _) = delete(&app, &token, "8c1f0a4e-3d2b-4c5a-9e6f-7a8b9c0d1e2f").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = delete(&app, &token, "not-an-id").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Book not found");
}

#[tokio::test]
async fn test_delete_survives_image_host_failure() {
    let app = TestApp::new();
    let (token, _) = app.register("reader", "reader@example.com").await;
    let book = app.create_review(&token, "Dune").await;
    app.images.fail_destroys(true);

    let (status, _) = delete(&app, &token, book["id"].as_str().unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.images.destroyed().await.len(), 1);
    assert_eq!(list(&app, &token, "").await["totalBooks"], 0);
}

#[tokio::test]
async fn test_delete_legacy_review_without_image_handle() {
    let app = TestApp::new();
    let (token, user) = app.register("reader", "reader@example.com").await;
    let owner: UserId = user["id"].as_str().unwrap().parse().unwrap();

    let legacy = app
        .state
        .reviews
        .insert_review(NewReview {
            title: "Old".to_string(),
            caption: "Imported".to_string(),
            rating: 2,
            image: "https://img.test/legacy.png".to_string(),
            image_delete_handle: None,
            user: owner,
        })
        .await
        .unwrap();

    let (status, _) = delete(&app, &token, &legacy.id.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert!(app.images.destroyed().await.is_empty());
}
