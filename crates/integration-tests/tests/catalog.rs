//! Integration tests for the public catalog and its admin-only
//! mutation paths.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The API server running (cargo run -p forno-api)
//!
//! Run with: cargo test -p forno-integration-tests -- --ignored

use forno_integration_tests::{base_url, client, login_as};
use reqwest::StatusCode;
use serde_json::{Value, json};

fn pizza_body() -> Value {
    json!({
        "name": "Margherita",
        "description": "Tomato, mozzarella, basil",
        "category": "classic",
        "image_url": "/images/margherita.png",
        "is_popular": true,
        "toppings": ["tomato", "mozzarella", "basil"],
        "prices": [
            { "size": "small", "price": "8.00" },
            { "size": "medium", "price": "10.00" },
            { "size": "large", "price": "12.00" }
        ]
    })
}

#[tokio::test]
#[ignore = "requires live server and database"]
async fn anonymous_can_list_catalog() {
    let resp = client()
        .get(format!("{}/pizzas", base_url()))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    let pizzas: Vec<Value> = resp.json().await.expect("invalid json");
    for pizza in &pizzas {
        assert!(pizza.get("prices").is_some(), "pizza missing price list");
    }
}

#[tokio::test]
#[ignore = "requires live server and database"]
async fn popular_subset_only_contains_popular() {
    let resp = client()
        .get(format!("{}/pizzas/popular", base_url()))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    let pizzas: Vec<Value> = resp.json().await.expect("invalid json");
    for pizza in &pizzas {
        assert_eq!(pizza["is_popular"], json!(true));
    }
}

#[tokio::test]
#[ignore = "requires live server and database"]
async fn anonymous_cannot_create_pizza() {
    let before: Vec<Value> = client()
        .get(format!("{}/pizzas", base_url()))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid json");

    let resp = client()
        .post(format!("{}/pizzas", base_url()))
        .json(&pizza_body())
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Catalog unchanged
    let after: Vec<Value> = client()
        .get(format!("{}/pizzas", base_url()))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid json");
    assert_eq!(before.len(), after.len());
}

#[tokio::test]
#[ignore = "requires live server and database"]
async fn non_admin_cannot_create_pizza() {
    let client = login_as("catalog_plain_user", "hunter2hunter2").await;

    let resp = client
        .post(format!("{}/pizzas", base_url()))
        .json(&pizza_body())
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires live server, database, and a test_admin account"]
async fn admin_can_create_update_delete_pizza() {
    let client = login_as("test_admin", "admin-password-123").await;
    let base = base_url();

    // Create
    let resp = client
        .post(format!("{base}/pizzas"))
        .json(&pizza_body())
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let pizza: Value = resp.json().await.expect("invalid json");
    let id = pizza["id"].as_i64().expect("pizza id");
    assert_eq!(pizza["prices"].as_array().map(Vec::len), Some(3));

    // Update
    let mut body = pizza_body();
    body["name"] = json!("Margherita DOP");
    let resp = client
        .put(format!("{base}/pizzas/{id}"))
        .json(&body)
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.expect("invalid json");
    assert_eq!(updated["name"], json!("Margherita DOP"));

    // Delete
    let resp = client
        .delete(format!("{base}/pizzas/{id}"))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "requires live server, database, and a test_admin account"]
async fn partial_update_keeps_absent_fields() {
    let client = login_as("test_admin", "admin-password-123").await;
    let base = base_url();

    let resp = client
        .post(format!("{base}/pizzas"))
        .json(&pizza_body())
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let pizza: Value = resp.json().await.expect("invalid json");
    let id = pizza["id"].as_i64().expect("pizza id");

    // Patch only the name; everything else must survive
    let resp = client
        .patch(format!("{base}/pizzas/{id}"))
        .json(&json!({ "name": "Margherita Extra" }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let patched: Value = resp.json().await.expect("invalid json");

    assert_eq!(patched["name"], json!("Margherita Extra"));
    assert_eq!(patched["description"], pizza["description"]);
    assert_eq!(patched["prices"], pizza["prices"]);

    let resp = client
        .delete(format!("{base}/pizzas/{id}"))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "requires live server, database, and a test_admin account"]
async fn create_pizza_with_bad_category_names_the_field() {
    let client = login_as("test_admin", "admin-password-123").await;

    let mut body = pizza_body();
    body["category"] = json!("dessert");

    let resp = client
        .post(format!("{}/pizzas", base_url()))
        .json(&body)
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("invalid json");
    assert!(body["errors"]["category"].is_array());
}
