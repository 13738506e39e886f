//! Integration tests for the catalog endpoints.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied (tl-cli migrate)
//! - A seeded catalog (tl-cli seed catalog -f crates/cli/data/catalog.yaml)
//! - The storefront server running (cargo run -p treadline-storefront)
//!
//! Run with: cargo test -p treadline-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::Value;
use uuid::Uuid;

/// Base URL for the storefront API (configurable via environment).
fn base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_products_are_listed() {
    let base_url = base_url();

    let resp = reqwest::get(format!("{base_url}/products"))
        .await
        .expect("Failed to list products");

    assert_eq!(resp.status(), StatusCode::OK);
    let products: Value = resp.json().await.expect("Failed to parse response");

    let products = products.as_array().expect("Expected a product array");
    assert!(!products.is_empty(), "Seeded catalog should list products");

    for product in products {
        assert!(product["id"].is_string());
        assert!(product["name"].is_string());
        assert!(product["price"].is_string());
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_variants_are_listed_for_a_product() {
    let base_url = base_url();

    let products: Value = reqwest::get(format!("{base_url}/products"))
        .await
        .expect("Failed to list products")
        .json()
        .await
        .expect("Failed to parse response");

    let product_id = products[0]["id"].as_str().expect("Expected a product id");

    let resp = reqwest::get(format!("{base_url}/products/{product_id}/variants"))
        .await
        .expect("Failed to list variants");

    assert_eq!(resp.status(), StatusCode::OK);
    let variants: Value = resp.json().await.expect("Failed to parse response");

    let variants = variants.as_array().expect("Expected a variant array");
    assert!(!variants.is_empty(), "Seeded products should have variants");

    for variant in variants {
        assert!(variant["id"].is_string());
        assert!(variant["color"].is_string());
        assert!(variant["size"].is_string());
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_unknown_product_is_not_found() {
    let base_url = base_url();
    let missing = Uuid::new_v4();

    let resp = reqwest::get(format!("{base_url}/products/{missing}/variants"))
        .await
        .expect("Failed to reach variants endpoint");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("Failed to parse error body");
    assert!(body["error"].is_string());
}
