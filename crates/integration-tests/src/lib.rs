//! Integration tests for Forno.
//!
//! # Running Tests
//!
//! These tests need a running server and database:
//!
//! ```bash
//! # Apply migrations and start the API
//! cargo run -p forno-cli -- migrate
//! cargo run -p forno-api
//!
//! # Run the ignored live tests
//! cargo test -p forno-integration-tests -- --ignored
//! ```
//!
//! The admin-path tests additionally expect an account whose profile
//! carries the admin flag:
//!
//! ```bash
//! forno-cli admin grant -u test_admin
//! ```

use reqwest::Client;
use serde_json::{Value, json};

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("FORNO_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

/// Create an HTTP client with a cookie store, so the session cookie
/// from login is sent on subsequent requests.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Register a fresh user (ignoring an already-exists error) and log
/// in, returning an authenticated client.
///
/// # Panics
///
/// Panics if registration or login requests fail to send, or if the
/// login is rejected.
pub async fn login_as(username: &str, password: &str) -> Client {
    let client = client();
    let base = base_url();

    // Registration may 400 if the user already exists from a previous
    // run; that's fine, login below is the real gate.
    let _ = client
        .post(format!("{base}/register"))
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": password,
        }))
        .send()
        .await
        .expect("Failed to send register request");

    let resp = client
        .post(format!("{base}/auth/login"))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    assert!(
        resp.status().is_success(),
        "login failed for {username}: {}",
        resp.status()
    );

    client
}

/// Create a minimal valid order body with a single item.
#[must_use]
pub fn sample_order_body(pizza_id: i64) -> Value {
    json!({
        "delivery_method": "delivery",
        "payment_method": "card",
        "customer_name": "Test Customer",
        "customer_phone": "555-0100",
        "delivery_address": "1 Test Street",
        "delivery_instructions": "",
        "subtotal": "20.00",
        "tax": "1.60",
        "delivery_fee": "3.00",
        "total": "24.60",
        "items": [
            { "pizza_id": pizza_id, "size": "medium", "quantity": 2, "price": "10.00" }
        ]
    })
}
