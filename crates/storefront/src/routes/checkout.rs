//! Checkout hand-off gate.
//!
//! The storefront stops at checkout's front door: this handler confirms
//! the shopper is signed in and has something to buy, then reports the
//! cart that would be handed to a checkout provider. Payment, inventory,
//! and order placement live on the other side of that hand-off.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::models::{CartView, ShopperIdentity};
use crate::state::AppState;

/// Response confirming what would be handed to checkout.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub status: &'static str,
    pub cart: CartView,
}

/// The signed-in shopper's cart, ready for hand-off.
///
/// GET /checkout
///
/// # Errors
///
/// Returns 401 for guests and 400 when the cart is empty.
#[instrument(skip(state, user))]
pub async fn begin(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<CheckoutResponse>, AppError> {
    let view = state.cart().view(ShopperIdentity::user(user.id)).await?;
    if view.is_empty() {
        return Err(AppError::BadRequest(
            "cannot check out an empty cart".to_owned(),
        ));
    }

    Ok(Json(CheckoutResponse {
        status: "ready",
        cart: view.as_ref().clone(),
    }))
}
