//! Cart route handlers.
//!
//! Every mutation responds with the freshly assembled cart, fetched again
//! through the service after the write. Clients replace their state with
//! the response body instead of patching totals locally.
//!
//! Identity rules: reads work for anyone, including shoppers with no
//! session at all. Mutations by signed-in users act on the user's cart;
//! anyone else gets a guest token minted into their session on first use.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use treadline_core::{CartItemId, VariantId};

use crate::error::{AppError, add_breadcrumb};
use crate::middleware::{Shopper, ensure_guest_token};
use crate::models::{CartView, ShopperIdentity};
use crate::state::AppState;

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub variant_id: VariantId,
    pub quantity: Option<i32>,
}

/// Update quantity request body.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

/// Resolve the identity a mutation acts under.
///
/// Signed-in users act as themselves. Anyone else needs a live guest
/// token, minted into the session here on first use.
async fn mutable_identity(
    state: &AppState,
    session: &Session,
    identity: ShopperIdentity,
) -> Result<ShopperIdentity, AppError> {
    if identity.user_id.is_some() {
        return Ok(identity);
    }

    let token = ensure_guest_token(session, state.store()).await?;
    Ok(ShopperIdentity {
        guest_token: Some(token),
        ..identity
    })
}

async fn current_view(state: &AppState, identity: ShopperIdentity) -> Result<CartView, AppError> {
    let view = state.cart().view(identity).await?;
    Ok(view.as_ref().clone())
}

/// The shopper's current cart.
///
/// GET /cart
///
/// Reading never creates a cart or a guest session; a shopper without
/// either sees an empty cart.
///
/// # Errors
///
/// Returns `AppError::Cart` if the store fails.
#[instrument(skip(state, identity))]
pub async fn show(
    State(state): State<AppState>,
    Shopper(identity): Shopper,
) -> Result<Json<CartView>, AppError> {
    Ok(Json(current_view(&state, identity).await?))
}

/// Add an item to the cart, creating the cart on first use.
///
/// POST /cart/items
///
/// Omitting `quantity` adds one unit. Adding a variant already in the
/// cart accumulates onto the existing line.
///
/// # Errors
///
/// Returns 400 for a non-positive quantity and 404 for an unknown variant.
#[instrument(skip(state, session, identity))]
pub async fn add_item(
    State(state): State<AppState>,
    session: Session,
    Shopper(identity): Shopper,
    Json(body): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartView>), AppError> {
    let identity = mutable_identity(&state, &session, identity).await?;
    let quantity = body.quantity.unwrap_or(1);

    state
        .cart()
        .add_item(identity, body.variant_id, quantity)
        .await?;

    add_breadcrumb(
        "cart",
        "Added item to cart",
        Some(&[("variant_id", &body.variant_id.to_string())]),
    );

    Ok((
        StatusCode::CREATED,
        Json(current_view(&state, identity).await?),
    ))
}

/// Set a line's quantity to an absolute value.
///
/// PUT /cart/items/{id}
///
/// # Errors
///
/// Returns 400 for a non-positive quantity and 404 for an unknown item.
#[instrument(skip(state, identity))]
pub async fn update_item(
    State(state): State<AppState>,
    Shopper(identity): Shopper,
    Path(item_id): Path<CartItemId>,
    Json(body): Json<UpdateQuantityRequest>,
) -> Result<Json<CartView>, AppError> {
    state
        .cart()
        .update_item_quantity(item_id, body.quantity)
        .await?;

    Ok(Json(current_view(&state, identity).await?))
}

/// Remove a line from the cart.
///
/// DELETE /cart/items/{id}
///
/// Removing an item that is already gone succeeds; the response is the
/// cart as it stands.
///
/// # Errors
///
/// Returns `AppError::Cart` if the store fails.
#[instrument(skip(state, identity))]
pub async fn remove_item(
    State(state): State<AppState>,
    Shopper(identity): Shopper,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<CartView>, AppError> {
    state.cart().remove_item(item_id).await?;
    Ok(Json(current_view(&state, identity).await?))
}

/// Empty the cart.
///
/// DELETE /cart
///
/// A shopper with no cart gets an empty view back; nothing is created.
///
/// # Errors
///
/// Returns `AppError::Cart` if the store fails.
#[instrument(skip(state, identity))]
pub async fn clear(
    State(state): State<AppState>,
    Shopper(identity): Shopper,
) -> Result<Json<CartView>, AppError> {
    state.cart().clear(identity).await?;
    Ok(Json(current_view(&state, identity).await?))
}
