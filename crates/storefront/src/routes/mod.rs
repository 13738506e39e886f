//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Catalog
//! GET  /products               - Product listing
//! GET  /products/{id}/variants - Color/size variants of a product
//!
//! # Cart (JSON; every mutation responds with the refreshed cart)
//! GET    /cart                 - Current cart
//! POST   /cart/items           - Add item (creates cart on first use)
//! PUT    /cart/items/{id}      - Set item quantity
//! DELETE /cart/items/{id}      - Remove item
//! DELETE /cart                 - Empty cart
//!
//! # Auth
//! POST /auth/register          - Create account, sign in, merge guest cart
//! POST /auth/login             - Sign in, merge guest cart
//! POST /auth/merge-cart        - Re-run the guest cart merge (requires auth)
//! POST /auth/logout            - Sign out, destroy session
//!
//! # Account (requires auth)
//! GET  /account                - Profile of the signed-in user
//! GET  /checkout               - Checkout hand-off gate
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::middleware::{auth_rate_limiter, cart_rate_limiter};
use crate::state::AppState;

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::index))
        .route("/{id}/variants", get(catalog::variants))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{id}",
            delete(cart::remove_item).put(cart::update_item),
        )
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/merge-cart", post(auth::merge_cart))
        .route("/logout", post(auth::logout))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new().route("/", get(account::show))
}

/// Create all routes for the storefront.
///
/// Rate limits apply per route group: tight on auth, looser on cart.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/products", catalog_routes())
        .nest("/cart", cart_routes().layer(cart_rate_limiter()))
        .nest("/auth", auth_routes().layer(auth_rate_limiter()))
        .nest("/account", account_routes())
        .route("/checkout", get(checkout::begin))
}
