//! Cart service.
//!
//! All operations take the shopper's identity explicitly; nothing in here
//! knows about cookies or sessions. Assembled cart views are cached per
//! owner and invalidated on every mutation, with a short TTL as a backstop.

mod client;
mod error;
mod merge;

pub use client::ClientCart;
pub use error::CartError;
pub use merge::MergeOutcome;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument};

use treadline_core::{CartId, CartItemId, Quantity, VariantId};

use crate::db::{RepositoryError, Store};
use crate::models::{CartOwner, CartView, ShopperIdentity};

/// Upper bound on cached cart views.
const VIEW_CACHE_CAPACITY: u64 = 10_000;

/// Backstop expiry for cached views; mutations invalidate eagerly.
const VIEW_CACHE_TTL: Duration = Duration::from_secs(60);

/// Cart service.
///
/// Cheap to clone; the store and view cache are shared.
#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn Store>,
    views: Cache<CartOwner, Arc<CartView>>,
}

impl CartService {
    /// Create a new cart service on top of a store.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        let views = Cache::builder()
            .max_capacity(VIEW_CACHE_CAPACITY)
            .time_to_live(VIEW_CACHE_TTL)
            .build();

        Self { store, views }
    }

    /// The shopper's current cart, assembled for display.
    ///
    /// Reading never creates a cart: a shopper with no identity or no cart
    /// gets an empty view.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Repository`] if the store fails.
    #[instrument(skip(self))]
    pub async fn view(&self, identity: ShopperIdentity) -> Result<Arc<CartView>, CartError> {
        let Some(owner) = identity.owner() else {
            return Ok(Arc::new(CartView::empty()));
        };

        if let Some(view) = self.views.get(&owner).await {
            debug!("cart view cache hit");
            return Ok(view);
        }

        let view = match self.store.find_cart(&owner).await? {
            Some(cart) => {
                let lines = self.store.cart_lines(cart.id).await?;
                Arc::new(CartView::from_lines(lines))
            }
            None => Arc::new(CartView::empty()),
        };

        self.views.insert(owner, Arc::clone(&view)).await;
        Ok(view)
    }

    /// Add `quantity` units of a variant to the shopper's cart, creating
    /// the cart on first use.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Validation`] if `quantity < 1`,
    /// [`CartError::MissingIdentity`] if the request carries no identity,
    /// and [`CartError::NotFound`] if the variant does not exist.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        identity: ShopperIdentity,
        variant_id: VariantId,
        quantity: i32,
    ) -> Result<(), CartError> {
        let quantity =
            Quantity::new(quantity).map_err(|e| CartError::Validation(e.to_string()))?;
        let owner = identity.owner().ok_or(CartError::MissingIdentity)?;

        let cart = self.store.find_or_create_cart(&owner).await?;
        self.store
            .upsert_item(cart.id, variant_id, quantity.get())
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CartError::NotFound("product variant"),
                other => other.into(),
            })?;

        self.views.invalidate(&owner).await;
        Ok(())
    }

    /// Set an item's quantity to an absolute value.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Validation`] if `quantity < 1` and
    /// [`CartError::NotFound`] if the item does not exist.
    #[instrument(skip(self))]
    pub async fn update_item_quantity(
        &self,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<(), CartError> {
        let quantity =
            Quantity::new(quantity).map_err(|e| CartError::Validation(e.to_string()))?;

        // TODO: scope the update by the caller's cart id so one shopper
        // cannot address another shopper's item rows.
        let item = self
            .store
            .set_item_quantity(item_id, quantity)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CartError::NotFound("cart item"),
                other => other.into(),
            })?;

        self.invalidate_cart(item.cart_id).await?;
        Ok(())
    }

    /// Remove an item from whatever cart holds it. Unknown items are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Repository`] if the store fails.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, item_id: CartItemId) -> Result<(), CartError> {
        if let Some(cart_id) = self.store.remove_item(item_id).await? {
            self.invalidate_cart(cart_id).await?;
        }
        Ok(())
    }

    /// Empty the shopper's cart, keeping the cart itself. A shopper with no
    /// identity or no cart has nothing to clear, which is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Repository`] if the store fails.
    #[instrument(skip(self))]
    pub async fn clear(&self, identity: ShopperIdentity) -> Result<(), CartError> {
        let Some(owner) = identity.owner() else {
            return Ok(());
        };

        if let Some(cart) = self.store.find_cart(&owner).await? {
            self.store.clear_cart(cart.id).await?;
            self.views.invalidate(&owner).await;
        }
        Ok(())
    }

    /// Drop the cached view for whichever owner holds `cart_id`.
    async fn invalidate_cart(&self, cart_id: CartId) -> Result<(), CartError> {
        if let Some(cart) = self.store.find_cart_by_id(cart_id).await? {
            self.views.invalidate(&cart.owner).await;
        }
        Ok(())
    }
}
