//! HTTP tests against a running server

use athenaeum_server::models::user::UserClaims;
use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Token signed with the server's secret, as the identity provider would
fn token(user_id: i32, is_staff: bool) -> String {
    let secret = std::env::var("JWT_SECRET")
        .unwrap_or_else(|_| "change-this-secret-in-production".to_string());
    let now = chrono::Utc::now().timestamp();
    UserClaims {
        sub: user_id.to_string(),
        user_id,
        username: format!("user{}", user_id),
        is_staff,
        exp: now + 3600,
        iat: now,
    }
    .create_token(&secret)
    .expect("Failed to sign token")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_list_books() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books?sort=rated&page=1", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert!(body["total"].is_number());
    assert_eq!(body["per_page"], 9);
}

#[tokio::test]
#[ignore]
async fn test_unknown_book() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books/999999", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_staff_cannot_borrow() {
    let client = Client::new();

    let response = client
        .post(format!("{}/books/1/borrow", BASE_URL))
        .bearer_auth(token(900_001, true))
        .send()
        .await
        .expect("Failed to send request");

    // 404 when the catalog is empty, refusal otherwise
    if response.status() != 404 {
        assert_eq!(response.status(), 403);
        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["error"], "forbidden-role");
    }
}

#[tokio::test]
#[ignore]
async fn test_return_unknown_borrow() {
    let client = Client::new();

    let response = client
        .post(format!("{}/borrows/999999/return", BASE_URL))
        .bearer_auth(token(900_002, false))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "not-found-or-already-returned");
}

#[tokio::test]
#[ignore]
async fn test_my_books() {
    let client = Client::new();

    let response = client
        .get(format!("{}/me/borrows", BASE_URL))
        .bearer_auth(token(900_003, false))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["active"].is_array());
    assert!(body["history"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_contact() {
    let client = Client::new();

    let response = client
        .post(format!("{}/contact", BASE_URL))
        .json(&json!({
            "name": "Test",
            "email": "test@example.org",
            "subject": "Hello",
            "message": "Just checking"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 202);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_borrow() {
    let client = Client::new();

    let response = client
        .post(format!("{}/books/1/borrow", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}
