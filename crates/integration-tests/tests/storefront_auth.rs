//! Integration tests for accounts, sign-in, and guest cart merging.
//!
//! Each test registers its own throwaway account (unique email per run) so
//! the tests can be re-run against the same database without cleanup.
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

/// An email address no previous test run has used.
fn unique_email() -> String {
    format!("shopper-{}@example.com", Uuid::new_v4())
}

/// Test helper: register an account and return the session response.
async fn register(client: &Client, email: &str) -> Value {
    let base_url = base_url();

    let resp = client
        .post(format!("{base_url}/auth/register"))
        .json(&json!({
            "name": "Test Shopper",
            "email": email,
            "password": PASSWORD,
        }))
        .send()
        .await
        .expect("Failed to register");

    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("Failed to parse session response")
}

/// Test helper: log in and return the session response.
async fn login(client: &Client, email: &str) -> Value {
    let base_url = base_url();

    let resp = client
        .post(format!("{base_url}/auth/login"))
        .json(&json!({ "email": email, "password": PASSWORD }))
        .send()
        .await
        .expect("Failed to log in");

    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.expect("Failed to parse session response")
}

/// Test helper: log out.
async fn logout(client: &Client) {
    let base_url = base_url();

    let resp = client
        .post(format!("{base_url}/auth/logout"))
        .send()
        .await
        .expect("Failed to log out");

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

/// Test helper: add a variant to the cart and return the updated view.
async fn add_first_variant(client: &Client, quantity: i32) -> Value {
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
    resp.json().await.expect("Failed to parse cart view")
}

/// Test helper: fetch the current cart view.
async fn get_cart(client: &Client) -> Value {
    let base_url = base_url();

    let resp = client
        .get(format!("{base_url}/cart"))
        .send()
        .await
        .expect("Failed to fetch cart");

    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.expect("Failed to parse cart view")
}

// ============================================================================
// Registration & Login
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_register_signs_the_shopper_in() {
    let client = client();
    let email = unique_email();

    let session = register(&client, &email).await;
    assert_eq!(session["user"]["email"], json!(email));
    assert_eq!(session["cart_merge"]["outcome"], "no_guest_token");

    let base_url = base_url();
    let resp = client
        .get(format!("{base_url}/account"))
        .send()
        .await
        .expect("Failed to fetch account");

    assert_eq!(resp.status(), StatusCode::OK);
    let account: Value = resp.json().await.expect("Failed to parse account");
    assert_eq!(account["email"], json!(email));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_duplicate_email_is_a_conflict() {
    let client = client();
    let email = unique_email();
    register(&client, &email).await;
    logout(&client).await;

    let base_url = base_url();
    let resp = client
        .post(format!("{base_url}/auth/register"))
        .json(&json!({
            "name": "Second Shopper",
            "email": email,
            "password": PASSWORD,
        }))
        .send()
        .await
        .expect("Failed to reach register endpoint");

    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_wrong_password_is_rejected() {
    let client = client();
    let email = unique_email();
    register(&client, &email).await;
    logout(&client).await;

    let base_url = base_url();
    let resp = client
        .post(format!("{base_url}/auth/login"))
        .json(&json!({ "email": email, "password": "not-the-password" }))
        .send()
        .await
        .expect("Failed to reach login endpoint");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("Failed to parse error body");
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_account_requires_a_session() {
    let client = client();
    let base_url = base_url();

    let resp = client
        .get(format!("{base_url}/account"))
        .send()
        .await
        .expect("Failed to reach account endpoint");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_logout_ends_the_session() {
    let client = client();
    let email = unique_email();
    register(&client, &email).await;
    logout(&client).await;

    let base_url = base_url();
    let resp = client
        .get(format!("{base_url}/account"))
        .send()
        .await
        .expect("Failed to reach account endpoint");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Cart Merging
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_login_adopts_the_guest_cart() {
    let client = client();
    let email = unique_email();

    // Create the account first, then come back as a guest.
    register(&client, &email).await;
    logout(&client).await;

    add_first_variant(&client, 2).await;

    let session = login(&client, &email).await;
    assert_eq!(session["cart_merge"]["outcome"], "reassigned");

    let cart = get_cart(&client).await;
    assert_eq!(cart["item_count"], 2);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_login_merges_into_an_existing_cart() {
    let client = client();
    let email = unique_email();

    // Build up a cart on the account.
    register(&client, &email).await;
    add_first_variant(&client, 2).await;
    logout(&client).await;

    // Add the same variant as a guest.
    add_first_variant(&client, 3).await;

    let session = login(&client, &email).await;
    assert_eq!(session["cart_merge"]["outcome"], "merged");

    // Quantities combined into a single line.
    let cart = get_cart(&client).await;
    let lines = cart["lines"].as_array().expect("Expected cart lines");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["quantity"], 5);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_register_adopts_the_guest_cart() {
    let client = client();
    let email = unique_email();

    add_first_variant(&client, 1).await;

    let session = register(&client, &email).await;
    assert_eq!(session["cart_merge"]["outcome"], "reassigned");

    let cart = get_cart(&client).await;
    assert_eq!(cart["item_count"], 1);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_login_without_a_guest_cart_merges_nothing() {
    let client = client();
    let email = unique_email();
    register(&client, &email).await;
    logout(&client).await;

    let session = login(&client, &email).await;
    assert_eq!(session["cart_merge"]["outcome"], "no_guest_token");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_explicit_merge_requires_a_session() {
    let client = client();
    let base_url = base_url();

    let resp = client
        .post(format!("{base_url}/auth/merge-cart"))
        .send()
        .await
        .expect("Failed to reach merge endpoint");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_explicit_merge_is_idempotent_after_sign_in() {
    let client = client();
    let email = unique_email();

    // Sign-in already consumed whatever guest token there was, so a
    // follow-up explicit merge has nothing left to do.
    register(&client, &email).await;

    let base_url = base_url();
    let resp = client
        .post(format!("{base_url}/auth/merge-cart"))
        .send()
        .await
        .expect("Failed to reach merge endpoint");

    assert_eq!(resp.status(), StatusCode::OK);
    let outcome: Value = resp.json().await.expect("Failed to parse merge outcome");
    assert_eq!(outcome["outcome"], "no_guest_token");
}
