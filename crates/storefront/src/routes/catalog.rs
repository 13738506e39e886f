//! Catalog route handlers.
//!
//! Read-only JSON endpoints over the product tables. The storefront UI
//! renders these; the cart endpoints reference variants by the IDs served
//! here.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use treadline_core::ProductId;

use crate::error::AppError;
use crate::models::{Product, VariantSummary};
use crate::state::AppState;

/// List all products.
///
/// GET /products
///
/// # Errors
///
/// Returns `AppError::Database` if the store fails.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    let products = state.store().list_products().await?;
    Ok(Json(products))
}

/// List the color/size variants of a product.
///
/// GET /products/{id}/variants
///
/// # Errors
///
/// Returns `AppError::NotFound` if the product has no variants, which for
/// this catalog means the product does not exist.
#[instrument(skip(state))]
pub async fn variants(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Vec<VariantSummary>>, AppError> {
    let variants = state.store().list_variants(product_id).await?;
    if variants.is_empty() {
        return Err(AppError::NotFound(format!("product {product_id}")));
    }
    Ok(Json(variants))
}
