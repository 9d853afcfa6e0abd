//! Registration and login integration tests.
//!
//! Tests verify:
//! - Registration returns a working token and the public user
//! - Validation order and messages
//! - Duplicate usernames and emails are rejected
//! - Login failures do not reveal which credential was wrong

use axum::http::{Method, StatusCode};
use serde_json::json;

use bookworm::model::{avatar_url, UserId};

use super::test_utils::{empty_request, json_request, TestApp};

async fn register_with(app: &TestApp, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    app.send(json_request(Method::POST, "/api/auth/register", None, body))
        .await
}

async fn login_with(app: &TestApp, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    app.send(json_request(Method::POST, "/api/auth/login", None, body))
        .await
}

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn test_register_returns_token_and_public_user() {
    let app = TestApp::new();

    let (status, body) = register_with(
        &app,
        json!({ "username": "reader", "email": "reader@example.com", "password": "secret123" }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["username"], "reader");
    assert_eq!(body["user"]["email"], "reader@example.com");
    assert_eq!(body["user"]["profileImage"], avatar_url("reader"));
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("passwordHash").is_none());

    // The token resolves to the new account
    let token = body["token"].as_str().unwrap();
    let user_id = app.state.tokens.verify(token).unwrap();
    let expected: UserId = body["user"]["id"].as_str().unwrap().parse().unwrap();
    assert_eq!(user_id, expected);
}

#[tokio::test]
async fn test_registered_token_opens_protected_routes() {
    let app = TestApp::new();
    let (token, _) = app.register("reader", "reader@example.com").await;

    let (status, body) = app
        .send(empty_request(Method::GET, "/api/books/user", Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_register_missing_fields() {
    let app = TestApp::new();

    for body in [
        json!({ "email": "a@example.com", "password": "secret123" }),
        json!({ "username": "reader", "password": "secret123" }),
        json!({ "username": "reader", "email": "a@example.com" }),
        json!({ "username": "", "email": "a@example.com", "password": "secret123" }),
        json!({}),
    ] {
        let (status, response) = register_with(&app, body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {}", body);
        assert_eq!(response["message"], "All fields are required");
    }
}

#[tokio::test]
async fn test_register_short_password() {
    let app = TestApp::new();
    let (status, body) = register_with(
        &app,
        json!({ "username": "reader", "email": "a@example.com", "password": "12345" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].as_str().unwrap().contains("Password"));
}

#[tokio::test]
async fn test_register_short_username() {
    let app = TestApp::new();
    let (status, body) = register_with(
        &app,
        json!({ "username": "ab", "email": "a@example.com", "password": "secret123" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("Username"));
}

#[tokio::test]
async fn test_password_checked_before_username() {
    let app = TestApp::new();
    let (_, body) = register_with(
        &app,
        json!({ "username": "ab", "email": "a@example.com", "password": "123" }),
    )
    .await;

    assert!(body["message"].as_str().unwrap().contains("Password"));
}

#[tokio::test]
async fn test_lengths_count_characters() {
    let app = TestApp::new();

    // Three characters, six bytes
    let (status, _) = register_with(
        &app,
        json!({ "username": "ééé", "email": "e@example.com", "password": "ñññññ1" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let app = TestApp::new();
    app.register("reader", "first@example.com").await;

    let (status, body) = register_with(
        &app,
        json!({ "username": "reader", "email": "second@example.com", "password": "secret123" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "conflict");
    assert_eq!(
        body["message"],
        "Username already exists, please login instead"
    );
}

#[tokio::test]
async fn test_duplicates_conflict_for_any_valid_password() {
    let app = TestApp::new();
    app.register("reader", "reader@example.com").await;

    for password in ["secret123", "different-password", "123456"] {
        let (status, body) = register_with(
            &app,
            json!({ "username": "reader", "email": "new@example.com", "password": password }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "conflict");

        let (status, body) = register_with(
            &app,
            json!({ "username": "newcomer", "email": "reader@example.com", "password": password }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "conflict");
    }
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::new();
    app.register("reader", "reader@example.com").await;

    let (status, body) = register_with(
        &app,
        json!({ "username": "another", "email": "reader@example.com", "password": "secret123" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "User with this email already exists, please login instead"
    );
}

#[tokio::test]
async fn test_register_malformed_json() {
    let app = TestApp::new();
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/auth/register")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_success() {
    let app = TestApp::new();
    let (_, user) = app.register("reader", "reader@example.com").await;

    let (status, body) = login_with(
        &app,
        json!({ "email": "reader@example.com", "password": "secret123" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"], user);

    let token = body["token"].as_str().unwrap();
    let (status, _) = app
        .send(empty_request(Method::GET, "/api/books", Some(token)))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::new();
    app.register("reader", "reader@example.com").await;

    let wrong_password = login_with(
        &app,
        json!({ "email": "reader@example.com", "password": "wrong-password" }),
    )
    .await;
    let unknown_email = login_with(
        &app,
        json!({ "email": "nobody@example.com", "password": "secret123" }),
    )
    .await;

    assert_eq!(wrong_password.0, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password.1["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_missing_fields() {
    let app = TestApp::new();

    let (status, body) = login_with(&app, json!({ "email": "reader@example.com" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "All fields are required");
}
