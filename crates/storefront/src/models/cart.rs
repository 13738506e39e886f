//! Cart domain types.
//!
//! A cart belongs to exactly one owner: either a signed-in user or an
//! anonymous guest session. The owner is modeled as an enum so calling code
//! cannot construct a cart that is simultaneously both, and the database
//! enforces the same rule with a CHECK constraint over the two columns.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use treadline_core::{CartId, CartItemId, GuestToken, Quantity, UserId, VariantId};

// =============================================================================
// Cart Ownership
// =============================================================================

/// Error converting a `(user_id, guest_token)` column pair into a [`CartOwner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CartOwnerError {
    /// Both owner columns were set on the same row.
    #[error("cart row has both a user id and a guest token")]
    BothSet,
    /// Neither owner column was set.
    #[error("cart row has neither a user id nor a guest token")]
    NeitherSet,
}

/// The owner of a cart.
///
/// Used as the lookup key for cart resolution and as the cache key for
/// assembled cart views, so it derives `Hash` and `Eq`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartOwner {
    /// Cart belongs to a signed-in user.
    User(UserId),
    /// Cart belongs to an anonymous guest session.
    Guest(GuestToken),
}

impl CartOwner {
    /// The user id, if this owner is a signed-in user.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Guest(_) => None,
        }
    }

    /// The guest token, if this owner is a guest session.
    #[must_use]
    pub const fn guest_token(&self) -> Option<GuestToken> {
        match self {
            Self::User(_) => None,
            Self::Guest(token) => Some(*token),
        }
    }

    /// Reconstruct an owner from the nullable column pair stored on a cart row.
    ///
    /// # Errors
    ///
    /// Returns [`CartOwnerError`] if the pair violates the exactly-one-owner
    /// rule. A violation means the database constraint was bypassed, so
    /// callers should surface it as data corruption rather than a user error.
    pub const fn from_columns(
        user_id: Option<UserId>,
        guest_token: Option<GuestToken>,
    ) -> Result<Self, CartOwnerError> {
        match (user_id, guest_token) {
            (Some(id), None) => Ok(Self::User(id)),
            (None, Some(token)) => Ok(Self::Guest(token)),
            (Some(_), Some(_)) => Err(CartOwnerError::BothSet),
            (None, None) => Err(CartOwnerError::NeitherSet),
        }
    }
}

/// The identities present on one request, as injected by the transport layer.
///
/// Cart logic never reads cookies or headers itself; whatever adapter fronts
/// it (HTTP session middleware, a test harness) resolves the raw transport
/// state into this pair and passes it in explicitly.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShopperIdentity {
    /// Signed-in user, if any.
    pub user_id: Option<UserId>,
    /// Guest session token, if any.
    pub guest_token: Option<GuestToken>,
}

impl ShopperIdentity {
    /// An identity for a signed-in user.
    #[must_use]
    pub const fn user(id: UserId) -> Self {
        Self {
            user_id: Some(id),
            guest_token: None,
        }
    }

    /// An identity for an anonymous guest.
    #[must_use]
    pub const fn guest(token: GuestToken) -> Self {
        Self {
            user_id: None,
            guest_token: Some(token),
        }
    }

    /// The cart owner this identity acts as.
    ///
    /// A signed-in user always wins over a lingering guest token; `None`
    /// means the request carries no identity at all.
    #[must_use]
    pub const fn owner(&self) -> Option<CartOwner> {
        if let Some(id) = self.user_id {
            Some(CartOwner::User(id))
        } else if let Some(token) = self.guest_token {
            Some(CartOwner::Guest(token))
        } else {
            None
        }
    }
}

// =============================================================================
// Persistent Rows
// =============================================================================

/// A cart (domain type).
#[derive(Debug, Clone)]
pub struct Cart {
    /// Unique cart ID.
    pub id: CartId,
    /// Who this cart belongs to.
    pub owner: CartOwner,
    /// When the cart was created.
    pub created_at: DateTime<Utc>,
    /// When the cart was last touched.
    pub updated_at: DateTime<Utc>,
}

/// A raw cart item row, as stored.
///
/// Display code should prefer [`CartLine`], which carries the joined product
/// data the storefront actually renders.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartItem {
    /// Unique item ID.
    pub id: CartItemId,
    /// Cart this item belongs to.
    pub cart_id: CartId,
    /// The product variant in the cart.
    pub product_variant_id: VariantId,
    /// How many units of the variant.
    pub quantity: Quantity,
    /// When the item was first added.
    pub created_at: DateTime<Utc>,
    /// When the quantity last changed.
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Display Types
// =============================================================================

/// A cart item joined with the product data needed to render it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartLine {
    /// ID of the underlying cart item row.
    pub item_id: CartItemId,
    /// The variant in the cart.
    pub product_variant_id: VariantId,
    /// Units of the variant.
    pub quantity: Quantity,
    /// Product display name.
    pub product_name: String,
    /// Unit price at display time.
    pub unit_price: Decimal,
    /// Product thumbnail URL, if one is set.
    pub thumbnail: Option<String>,
    /// Variant color name.
    pub color: String,
    /// Variant size label.
    pub size: String,
}

impl CartLine {
    /// Price of this line (unit price times quantity).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity.get())
    }
}

/// An assembled cart ready for display.
///
/// Totals are always recomputed from the lines they summarize, never
/// incrementally patched, so a view can only ever be internally consistent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    /// Lines in the order they were added.
    pub lines: Vec<CartLine>,
    /// Total number of units across all lines.
    pub item_count: i64,
    /// Sum of all line totals.
    pub subtotal: Decimal,
}

impl CartView {
    /// An empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            lines: Vec::new(),
            item_count: 0,
            subtotal: Decimal::ZERO,
        }
    }

    /// Build a view from joined lines, deriving the totals.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let item_count = lines.iter().map(|line| i64::from(line.quantity.get())).sum();
        let subtotal = lines.iter().map(CartLine::line_total).sum();
        Self {
            lines,
            item_count,
            subtotal,
        }
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
