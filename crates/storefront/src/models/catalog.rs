//! Catalog domain types.
//!
//! The catalog is deliberately small: products, and the color/size variants
//! shoppers actually add to a cart. Cart rows reference variants, never
//! products directly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use treadline_core::{ProductId, VariantId};

/// A product as listed on the storefront.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Short marketing copy, if any.
    pub description: Option<String>,
    /// Current unit price.
    pub price: Decimal,
    /// Thumbnail URL, if one is set.
    pub thumbnail: Option<String>,
}

/// A purchasable color/size combination of a product.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VariantSummary {
    /// Unique variant ID.
    pub id: VariantId,
    /// Color name.
    pub color: String,
    /// Size label.
    pub size: String,
}
