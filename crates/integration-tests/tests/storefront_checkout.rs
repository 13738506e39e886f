//! Integration tests for the checkout hand-off gate.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied (tl-cli migrate)
//! - A seeded catalog (tl-cli seed catalog -f crates/cli/data/catalog.yaml)
//! - The storefront server running (cargo run -p treadline-storefront)
//!
//! Run with: cargo test -p treadline-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

const PASSWORD: &str = "correct-horse-battery-staple";

/// Base URL for the storefront API (configurable via environment).
fn base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A client that holds cookies across requests, like a browser would.
fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Test helper: register a throwaway account, leaving the client signed in.
async fn register(client: &Client) {
    let base_url = base_url();

    let resp = client
        .post(format!("{base_url}/auth/register"))
        .json(&json!({
            "name": "Test Shopper",
            "email": format!("shopper-{}@example.com", Uuid::new_v4()),
            "password": PASSWORD,
        }))
        .send()
        .await
        .expect("Failed to register");

    assert_eq!(resp.status(), StatusCode::CREATED);
}

/// Test helper: add the first catalog variant to the cart.
async fn add_first_variant(client: &Client, quantity: i32) {
    let base_url = base_url();

    let products: Value = client
        .get(format!("{base_url}/products"))
        .send()
        .await
        .expect("Failed to list products")
        .json()
        .await
        .expect("Failed to parse products");
    let product_id = products[0]["id"].as_str().expect("Expected a product id");

    let variants: Value = client
        .get(format!("{base_url}/products/{product_id}/variants"))
        .send()
        .await
        .expect("Failed to list variants")
        .json()
        .await
        .expect("Failed to parse variants");
    let variant_id = variants[0]["id"].as_str().expect("Expected a variant id");

    let resp = client
        .post(format!("{base_url}/cart/items"))
        .json(&json!({ "variant_id": variant_id, "quantity": quantity }))
        .send()
        .await
        .expect("Failed to add item");

    assert_eq!(resp.status(), StatusCode::CREATED);
}

// ============================================================================
// Checkout Gate
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_checkout_turns_guests_away() {
    let client = client();
    let base_url = base_url();

    let resp = client
        .get(format!("{base_url}/checkout"))
        .send()
        .await
        .expect("Failed to reach checkout endpoint");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("Failed to parse error body");
    assert_eq!(body["error"], "sign in required");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_checkout_rejects_an_empty_cart() {
    let client = client();
    register(&client).await;

    let base_url = base_url();
    let resp = client
        .get(format!("{base_url}/checkout"))
        .send()
        .await
        .expect("Failed to reach checkout endpoint");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_checkout_reports_the_cart_it_would_hand_off() {
    let client = client();
    register(&client).await;
    add_first_variant(&client, 2).await;

    let base_url = base_url();
    let resp = client
        .get(format!("{base_url}/checkout"))
        .send()
        .await
        .expect("Failed to reach checkout endpoint");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse checkout response");
    assert_eq!(body["status"], "ready");
    assert_eq!(body["cart"]["item_count"], 2);
}
