//! Integration tests for order placement, listing, and status updates.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The API server running (cargo run -p forno-api)
//! - At least one pizza in the catalog with a medium price of 10.00
//!
//! Run with: cargo test -p forno-integration-tests -- --ignored

use forno_integration_tests::{base_url, client, login_as, sample_order_body};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

/// Find a pizza id to order against. The catalog must be seeded first.
async fn any_pizza_id(client: &Client) -> i64 {
    let pizzas: Vec<Value> = client
        .get(format!("{}/pizzas", base_url()))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid json");

    pizzas
        .first()
        .and_then(|p| p["id"].as_i64())
        .expect("catalog is empty; seed at least one pizza first")
}

#[tokio::test]
#[ignore = "requires live server and database"]
async fn anonymous_cannot_list_orders() {
    let resp = client()
        .get(format!("{}/orders", base_url()))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("invalid json");
    assert_eq!(body["detail"], json!("Authentication required."));
}

#[tokio::test]
#[ignore = "requires live server and database"]
async fn placed_order_computes_item_totals() {
    let client = login_as("orders_buyer", "hunter2hunter2").await;
    let pizza_id = any_pizza_id(&client).await;

    let resp = client
        .post(format!("{}/orders", base_url()))
        .json(&sample_order_body(pizza_id))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.expect("invalid json");

    assert_eq!(order["status"], json!("processing"));
    assert_eq!(order["total"], json!("24.60"));

    let items = order["items"].as_array().expect("items array");
    assert_eq!(items.len(), 1);
    // 10.00 x 2, computed server-side
    assert_eq!(items[0]["total"], json!("20.00"));
    assert_eq!(items[0]["pizza"]["id"].as_i64(), Some(pizza_id));
}

#[tokio::test]
#[ignore = "requires live server and database"]
async fn empty_item_list_is_rejected() {
    let client = login_as("orders_buyer", "hunter2hunter2").await;

    let mut body = sample_order_body(1);
    body["items"] = json!([]);

    let resp = client
        .post(format!("{}/orders", base_url()))
        .json(&body)
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("invalid json");
    assert!(body["errors"]["items"].is_array());
}

#[tokio::test]
#[ignore = "requires live server and database"]
async fn zero_quantity_is_rejected() {
    let client = login_as("orders_buyer", "hunter2hunter2").await;
    let pizza_id = any_pizza_id(&client).await;

    let mut body = sample_order_body(pizza_id);
    body["items"][0]["quantity"] = json!(0);

    let resp = client
        .post(format!("{}/orders", base_url()))
        .json(&body)
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires live server and database"]
async fn users_only_see_their_own_orders() {
    let alice = login_as("orders_alice", "hunter2hunter2").await;
    let bob = login_as("orders_bob", "hunter2hunter2").await;
    let pizza_id = any_pizza_id(&alice).await;

    let resp = alice
        .post(format!("{}/orders", base_url()))
        .json(&sample_order_body(pizza_id))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.expect("invalid json");
    let order_id = order["id"].as_i64().expect("order id");

    // Bob's listing never includes Alice's order
    let orders: Vec<Value> = bob
        .get(format!("{}/orders", base_url()))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid json");
    assert!(orders.iter().all(|o| o["id"].as_i64() != Some(order_id)));

    // Direct lookup is hidden too, not just forbidden
    let resp = bob
        .get(format!("{}/orders/{order_id}", base_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires live server and database"]
async fn orders_are_listed_newest_first() {
    let client = login_as("orders_buyer", "hunter2hunter2").await;
    let pizza_id = any_pizza_id(&client).await;

    for _ in 0..2 {
        let resp = client
            .post(format!("{}/orders", base_url()))
            .json(&sample_order_body(pizza_id))
            .send()
            .await
            .expect("request failed");
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let orders: Vec<Value> = client
        .get(format!("{}/orders", base_url()))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid json");

    assert!(orders.len() >= 2);
    let ids: Vec<i64> = orders.iter().filter_map(|o| o["id"].as_i64()).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(ids, sorted, "orders should come back newest first");
}

#[tokio::test]
#[ignore = "requires live server and database"]
async fn non_admin_cannot_update_order_status() {
    let client = login_as("orders_buyer", "hunter2hunter2").await;
    let pizza_id = any_pizza_id(&client).await;

    let resp = client
        .post(format!("{}/orders", base_url()))
        .json(&sample_order_body(pizza_id))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.expect("invalid json");
    let order_id = order["id"].as_i64().expect("order id");

    let resp = client
        .patch(format!("{}/orders/{order_id}/update_status", base_url()))
        .json(&json!({ "status": "completed" }))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Status unchanged
    let order: Value = client
        .get(format!("{}/orders/{order_id}", base_url()))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid json");
    assert_eq!(order["status"], json!("processing"));
}

#[tokio::test]
#[ignore = "requires live server, database, and a test_admin account"]
async fn admin_can_update_order_status() {
    let buyer = login_as("orders_buyer", "hunter2hunter2").await;
    let admin = login_as("test_admin", "admin-password-123").await;
    let pizza_id = any_pizza_id(&buyer).await;

    let resp = buyer
        .post(format!("{}/orders", base_url()))
        .json(&sample_order_body(pizza_id))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.expect("invalid json");
    let order_id = order["id"].as_i64().expect("order id");

    let resp = admin
        .patch(format!("{}/orders/{order_id}/update_status", base_url()))
        .json(&json!({ "status": "preparing" }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.expect("invalid json");
    assert_eq!(updated["status"], json!("preparing"));
}

#[tokio::test]
#[ignore = "requires live server, database, and a test_admin account"]
async fn unknown_status_value_names_the_field() {
    let admin = login_as("test_admin", "admin-password-123").await;

    let resp = admin
        .patch(format!("{}/orders/1/update_status", base_url()))
        .json(&json!({ "status": "teleported" }))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("invalid json");
    assert!(body["errors"]["status"].is_array());
}
