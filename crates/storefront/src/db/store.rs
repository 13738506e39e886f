//! Storage traits.
//!
//! Services depend on these traits rather than on a concrete backend, so the
//! cart and auth logic can run against [`PgStore`](super::PgStore) in
//! production and [`MemoryStore`](super::MemoryStore) in tests without
//! changing shape.

use async_trait::async_trait;

use treadline_core::{CartId, CartItemId, Email, GuestToken, ProductId, Quantity, UserId, VariantId};

use super::RepositoryError;
use crate::models::{Cart, CartItem, CartLine, CartOwner, GuestSession, Product, User, VariantSummary};

/// User account persistence.
#[async_trait]
pub trait UserRepo {
    /// Create a user and their password hash in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Conflict`] if the email is already taken.
    async fn create_user(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError>;

    /// Look up a user by email.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Look up a user by ID.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Fetch a user together with their password hash, for credential checks.
    ///
    /// Returns `None` if the user does not exist or has no password set.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    async fn password_hash_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;
}

/// Guest session persistence.
#[async_trait]
pub trait GuestSessionRepo {
    /// Resolve a presented token to a live session, minting a fresh one when
    /// the token is absent, unknown, or expired.
    ///
    /// An expired row is deleted before the replacement is minted, so a dead
    /// token can never be revived by presenting it again.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if a query fails.
    async fn get_or_create_session(
        &self,
        presented: Option<GuestToken>,
    ) -> Result<GuestSession, RepositoryError>;

    /// Delete a session by token. Deleting an unknown token is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    async fn delete_session(&self, token: GuestToken) -> Result<(), RepositoryError>;

    /// Purge every expired session row, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    async fn delete_expired_sessions(&self) -> Result<u64, RepositoryError>;
}

/// Cart persistence.
#[async_trait]
pub trait CartRepo {
    /// Look up the cart for an owner.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    async fn find_cart(&self, owner: &CartOwner) -> Result<Option<Cart>, RepositoryError>;

    /// Look up a cart by its ID.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    async fn find_cart_by_id(&self, cart_id: CartId) -> Result<Option<Cart>, RepositoryError>;

    /// Create a cart for an owner that must not already have one.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Conflict`] if the owner already has a cart.
    async fn create_cart(&self, owner: &CartOwner) -> Result<Cart, RepositoryError>;

    /// Fetch the owner's cart, creating it if none exists.
    ///
    /// Concurrent callers racing on the same owner both land on the same
    /// cart; the insert is conditional at the database, not check-then-act
    /// in application code.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if a query fails.
    async fn find_or_create_cart(&self, owner: &CartOwner) -> Result<Cart, RepositoryError>;

    /// Raw item rows for a cart.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    async fn cart_items(&self, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError>;

    /// Display lines for a cart, joined with product data, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    async fn cart_lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError>;

    /// Add `delta` units of a variant to a cart in one atomic statement.
    ///
    /// Inserts a fresh row when the variant is not yet in the cart, otherwise
    /// adds `delta` to the stored quantity. `delta` may be negative for an
    /// existing row as long as the result stays at least 1.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Validation`] if the resulting quantity
    /// would drop below 1, and [`RepositoryError::NotFound`] if the cart or
    /// variant does not exist.
    async fn upsert_item(
        &self,
        cart_id: CartId,
        variant_id: VariantId,
        delta: i32,
    ) -> Result<CartItem, RepositoryError>;

    /// Set an item's quantity to an absolute value.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if the item does not exist.
    async fn set_item_quantity(
        &self,
        item_id: CartItemId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError>;

    /// Remove an item, reporting which cart it was removed from.
    ///
    /// Removing an unknown item is a no-op and returns `None`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    async fn remove_item(&self, item_id: CartItemId) -> Result<Option<CartId>, RepositoryError>;

    /// Delete every item in a cart, keeping the cart row itself.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    async fn clear_cart(&self, cart_id: CartId) -> Result<(), RepositoryError>;

    /// Hand a cart to a different owner.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if the cart or the new owning
    /// user does not exist and [`RepositoryError::Conflict`] if the new
    /// owner already has a cart.
    async fn reassign_cart_owner(
        &self,
        cart_id: CartId,
        owner: &CartOwner,
    ) -> Result<(), RepositoryError>;

    /// Delete a cart and its items. Deleting an unknown cart is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    async fn delete_cart(&self, cart_id: CartId) -> Result<(), RepositoryError>;
}

/// Product catalog reads.
#[async_trait]
pub trait CatalogRepo {
    /// All products, in display order.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    /// The color/size variants of a product.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    async fn list_variants(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<VariantSummary>, RepositoryError>;
}

/// The full storage surface the application is wired against.
#[async_trait]
pub trait Store: UserRepo + GuestSessionRepo + CartRepo + CatalogRepo + Send + Sync {
    /// Verify the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the backend cannot be reached.
    async fn health_check(&self) -> Result<(), RepositoryError>;
}
