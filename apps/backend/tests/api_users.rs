//! User registration and status API tests.
//!
//! These tests require a running PostgreSQL database.
//! Set DATABASE_URL environment variable before running.

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;

use common::fixtures;
use common::TestContext;

/// Test user registration without a name.
#[tokio::test]
#[ignore = "requires database"]
async fn test_register_user_without_name() {
    let ctx = TestContext::new_without_storage().await;
    let server = TestServer::new(ctx.router()).unwrap();

    let response = server
        .post("/api/users/register")
        .json(&fixtures::register_request(None))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();

    assert!(body.get("user_id").is_some());
    assert!(body.get("token").is_some());
    assert!(body["token"].as_str().unwrap().len() > 10);

    // Cleanup
    let user_id = body["user_id"].as_str().unwrap();
    let uuid = uuid::Uuid::parse_str(user_id).unwrap();
    ctx.cleanup_user(uuid).await;
}

/// Test user registration with a name.
#[tokio::test]
#[ignore = "requires database"]
async fn test_register_user_with_name() {
    let ctx = TestContext::new_without_storage().await;
    let server = TestServer::new(ctx.router()).unwrap();

    let response = server
        .post("/api/users/register")
        .json(&fixtures::register_request(Some("Test Student")))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body.get("user_id").is_some());

    let user_id = body["user_id"].as_str().unwrap();
    let uuid = uuid::Uuid::parse_str(user_id).unwrap();
    ctx.cleanup_user(uuid).await;
}

/// Test status endpoint requires authentication.
#[tokio::test]
#[ignore = "requires database"]
async fn test_status_requires_auth() {
    let ctx = TestContext::new_without_storage().await;
    let server = TestServer::new(ctx.router()).unwrap();

    let response = server.get("/api/users/status").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

/// Test status with a bad token is rejected.
#[tokio::test]
#[ignore = "requires database"]
async fn test_status_rejects_invalid_token() {
    let ctx = TestContext::new_without_storage().await;
    let server = TestServer::new(ctx.router()).unwrap();

    let response = server
        .get("/api/users/status")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value("not-a-real-token"),
        )
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

/// Test status with a valid token.
#[tokio::test]
#[ignore = "requires database"]
async fn test_status_with_valid_token() {
    let ctx = TestContext::new_without_storage().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (user_id, token) = ctx.create_test_user(Some("Test Student")).await;

    let response = server
        .get("/api/users/status")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["user_id"], user_id.to_string());
    assert_eq!(body["name"], "Test Student");

    ctx.cleanup_user(user_id).await;
}
