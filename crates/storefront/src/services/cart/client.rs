//! Cart state held on behalf of one rendering surface.
//!
//! [`ClientCart`] wraps the [`CartService`] for callers that want cart
//! state as a value: a current view, a transient error, and mutation
//! methods that refetch instead of patching totals locally. The
//! composition root constructs one per surface, calls
//! [`initialize`](ClientCart::initialize) once, and drops or
//! [`reset`](ClientCart::reset)s it when the visit ends.

use std::sync::Arc;

use tracing::warn;

use treadline_core::{CartItemId, VariantId};

use crate::models::{CartView, ShopperIdentity};

use super::{CartError, CartService};

/// Cart state for one shopper on one surface.
///
/// The held view is always a snapshot the server produced whole. After a
/// mutation the view is refetched rather than adjusted in place, so
/// totals can never drift from what the store would report. When an
/// operation fails the previous view stays put and [`error`](Self::error)
/// carries a message fit to show the shopper; the next successful
/// operation clears it.
pub struct ClientCart {
    service: CartService,
    identity: ShopperIdentity,
    view: Arc<CartView>,
    error: Option<String>,
}

impl ClientCart {
    /// Create an uninitialized client cart. The view is empty until
    /// [`initialize`](Self::initialize) runs.
    #[must_use]
    pub fn new(service: CartService, identity: ShopperIdentity) -> Self {
        Self {
            service,
            identity,
            view: Arc::new(CartView::empty()),
            error: None,
        }
    }

    /// Fetch the shopper's current cart.
    pub async fn initialize(&mut self) {
        self.refresh().await;
    }

    /// The last successfully fetched view.
    #[must_use]
    pub fn view(&self) -> &CartView {
        &self.view
    }

    /// The message for the most recent failure, if the last operation
    /// did not succeed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Add units of a variant to the cart.
    pub async fn add_to_cart(&mut self, variant_id: VariantId, quantity: i32) {
        match self
            .service
            .add_item(self.identity, variant_id, quantity)
            .await
        {
            Ok(()) => self.refresh().await,
            Err(e) => self.fail("add the item to your cart", &e),
        }
    }

    /// Set a line's quantity to an absolute value.
    pub async fn update_quantity(&mut self, item_id: CartItemId, quantity: i32) {
        match self.service.update_item_quantity(item_id, quantity).await {
            Ok(()) => self.refresh().await,
            Err(e) => self.fail("update the quantity", &e),
        }
    }

    /// Remove a line from the cart.
    pub async fn remove_from_cart(&mut self, item_id: CartItemId) {
        match self.service.remove_item(item_id).await {
            Ok(()) => self.refresh().await,
            Err(e) => self.fail("remove the item", &e),
        }
    }

    /// Empty the cart.
    pub async fn clear(&mut self) {
        match self.service.clear(self.identity).await {
            Ok(()) => self.refresh().await,
            Err(e) => self.fail("empty your cart", &e),
        }
    }

    /// Start acting as a different shopper and refetch. Used after sign-in
    /// or sign-out, when the same surface carries on under a new identity.
    pub async fn switch_identity(&mut self, identity: ShopperIdentity) {
        self.identity = identity;
        self.refresh().await;
    }

    /// Return to the pre-[`initialize`](Self::initialize) state: empty view,
    /// no error. The counterpart to `initialize` for surfaces that outlive
    /// a shopper's visit and must not show stale cart contents to the next
    /// one.
    pub fn reset(&mut self) {
        self.view = Arc::new(CartView::empty());
        self.error = None;
    }

    async fn refresh(&mut self) {
        match self.service.view(self.identity).await {
            Ok(view) => {
                self.view = view;
                self.error = None;
            }
            Err(e) => self.fail("load your cart", &e),
        }
    }

    fn fail(&mut self, action: &str, err: &CartError) {
        warn!(error = %err, "client cart operation failed");
        self.error = Some(describe(action, err));
    }
}

/// Validation messages are written for shoppers and pass through as-is;
/// everything else collapses to a generic retry prompt.
fn describe(action: &str, err: &CartError) -> String {
    match err {
        CartError::Validation(message) => message.clone(),
        _ => format!("Could not {action}. Please try again."),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use treadline_core::{
        CartId, CartItemId, Email, GuestToken, ProductId, Quantity, UserId, VariantId,
    };

    use crate::db::{
        CartRepo, CatalogRepo, GuestSessionRepo, MemoryStore, RepositoryError, Store, UserRepo,
    };
    use crate::models::{
        Cart, CartItem, CartLine, CartOwner, GuestSession, Product, ShopperIdentity, User,
        VariantSummary,
    };
    use crate::services::cart::CartService;

    use super::ClientCart;

    /// [`MemoryStore`] with a kill switch. While tripped, every call fails
    /// the way a lost database connection would.
    #[derive(Clone)]
    struct FlakyStore {
        inner: MemoryStore,
        broken: Arc<AtomicBool>,
    }

    impl FlakyStore {
        fn new(inner: MemoryStore) -> Self {
            Self {
                inner,
                broken: Arc::new(AtomicBool::new(false)),
            }
        }

        fn set_broken(&self, broken: bool) {
            self.broken.store(broken, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), RepositoryError> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl UserRepo for FlakyStore {
        async fn create_user(
            &self,
            name: &str,
            email: &Email,
            password_hash: &str,
        ) -> Result<User, RepositoryError> {
            self.check()?;
            self.inner.create_user(name, email, password_hash).await
        }

        async fn find_user_by_email(
            &self,
            email: &Email,
        ) -> Result<Option<User>, RepositoryError> {
            self.check()?;
            self.inner.find_user_by_email(email).await
        }

        async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
            self.check()?;
            self.inner.find_user_by_id(id).await
        }

        async fn password_hash_by_email(
            &self,
            email: &Email,
        ) -> Result<Option<(User, String)>, RepositoryError> {
            self.check()?;
            self.inner.password_hash_by_email(email).await
        }
    }

    #[async_trait]
    impl GuestSessionRepo for FlakyStore {
        async fn get_or_create_session(
            &self,
            presented: Option<GuestToken>,
        ) -> Result<GuestSession, RepositoryError> {
            self.check()?;
            self.inner.get_or_create_session(presented).await
        }

        async fn delete_session(&self, token: GuestToken) -> Result<(), RepositoryError> {
            self.check()?;
            self.inner.delete_session(token).await
        }

        async fn delete_expired_sessions(&self) -> Result<u64, RepositoryError> {
            self.check()?;
            self.inner.delete_expired_sessions().await
        }
    }

    #[async_trait]
    impl CartRepo for FlakyStore {
        async fn find_cart(&self, owner: &CartOwner) -> Result<Option<Cart>, RepositoryError> {
            self.check()?;
            self.inner.find_cart(owner).await
        }

        async fn find_cart_by_id(
            &self,
            cart_id: CartId,
        ) -> Result<Option<Cart>, RepositoryError> {
            self.check()?;
            self.inner.find_cart_by_id(cart_id).await
        }

        async fn create_cart(&self, owner: &CartOwner) -> Result<Cart, RepositoryError> {
            self.check()?;
            self.inner.create_cart(owner).await
        }

        async fn find_or_create_cart(&self, owner: &CartOwner) -> Result<Cart, RepositoryError> {
            self.check()?;
            self.inner.find_or_create_cart(owner).await
        }

        async fn cart_items(&self, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError> {
            self.check()?;
            self.inner.cart_items(cart_id).await
        }

        async fn cart_lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
            self.check()?;
            self.inner.cart_lines(cart_id).await
        }

        async fn upsert_item(
            &self,
            cart_id: CartId,
            variant_id: VariantId,
            delta: i32,
        ) -> Result<CartItem, RepositoryError> {
            self.check()?;
            self.inner.upsert_item(cart_id, variant_id, delta).await
        }

        async fn set_item_quantity(
            &self,
            item_id: CartItemId,
            quantity: Quantity,
        ) -> Result<CartItem, RepositoryError> {
            self.check()?;
            self.inner.set_item_quantity(item_id, quantity).await
        }

        async fn remove_item(
            &self,
            item_id: CartItemId,
        ) -> Result<Option<CartId>, RepositoryError> {
            self.check()?;
            self.inner.remove_item(item_id).await
        }

        async fn clear_cart(&self, cart_id: CartId) -> Result<(), RepositoryError> {
            self.check()?;
            self.inner.clear_cart(cart_id).await
        }

        async fn reassign_cart_owner(
            &self,
            cart_id: CartId,
            owner: &CartOwner,
        ) -> Result<(), RepositoryError> {
            self.check()?;
            self.inner.reassign_cart_owner(cart_id, owner).await
        }

        async fn delete_cart(&self, cart_id: CartId) -> Result<(), RepositoryError> {
            self.check()?;
            self.inner.delete_cart(cart_id).await
        }
    }

    #[async_trait]
    impl CatalogRepo for FlakyStore {
        async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
            self.check()?;
            self.inner.list_products().await
        }

        async fn list_variants(
            &self,
            product_id: ProductId,
        ) -> Result<Vec<VariantSummary>, RepositoryError> {
            self.check()?;
            self.inner.list_variants(product_id).await
        }
    }

    #[async_trait]
    impl Store for FlakyStore {
        async fn health_check(&self) -> Result<(), RepositoryError> {
            self.check()?;
            self.inner.health_check().await
        }
    }

    struct Fixture {
        client: ClientCart,
        service: CartService,
        flaky: FlakyStore,
        identity: ShopperIdentity,
        v1: VariantSummary,
        v2: VariantSummary,
    }

    fn fixture() -> Fixture {
        let memory = MemoryStore::new();
        let runner = memory
            .add_product("Cascadia Trail Runner", Decimal::new(12900, 2))
            .unwrap();
        let boot = memory
            .add_product("Ridgeway Mid", Decimal::new(14900, 2))
            .unwrap();
        let v1 = memory.add_variant(runner.id, "Slate", "42").unwrap();
        let v2 = memory.add_variant(boot.id, "Moss", "43").unwrap();

        let flaky = FlakyStore::new(memory);
        let service = CartService::new(Arc::new(flaky.clone()));
        let identity = ShopperIdentity::guest(GuestToken::mint());

        Fixture {
            client: ClientCart::new(service.clone(), identity),
            service,
            flaky,
            identity,
            v1,
            v2,
        }
    }

    #[tokio::test]
    async fn initialize_loads_whatever_the_shopper_already_has() {
        let mut f = fixture();
        f.service.add_item(f.identity, f.v1.id, 2).await.unwrap();

        f.client.initialize().await;

        assert_eq!(f.client.view().item_count, 2);
        assert_eq!(f.client.view().subtotal, Decimal::new(25800, 2));
        assert!(f.client.error().is_none());
    }

    #[tokio::test]
    async fn mutations_refetch_instead_of_patching_totals() {
        let mut f = fixture();
        f.client.initialize().await;

        f.client.add_to_cart(f.v1.id, 1).await;
        f.client.add_to_cart(f.v2.id, 2).await;

        let view = f.client.view();
        assert_eq!(view.lines.len(), 2);
        assert_eq!(view.item_count, 3);
        assert_eq!(view.subtotal, Decimal::new(12900 + 2 * 14900, 2));
    }

    #[tokio::test]
    async fn update_and_remove_flow_through_to_the_view() {
        let mut f = fixture();
        f.client.initialize().await;
        f.client.add_to_cart(f.v1.id, 1).await;
        f.client.add_to_cart(f.v2.id, 1).await;

        let item_id = f.client.view().lines[0].item_id;
        f.client.update_quantity(item_id, 4).await;
        assert_eq!(f.client.view().item_count, 5);

        f.client.remove_from_cart(item_id).await;
        let view = f.client.view();
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.item_count, 1);
    }

    #[tokio::test]
    async fn clear_leaves_an_empty_view() {
        let mut f = fixture();
        f.client.initialize().await;
        f.client.add_to_cart(f.v1.id, 3).await;

        f.client.clear().await;

        assert!(f.client.view().is_empty());
        assert!(f.client.error().is_none());
    }

    #[tokio::test]
    async fn failure_keeps_the_previous_view_and_sets_an_error() {
        let mut f = fixture();
        f.client.initialize().await;
        f.client.add_to_cart(f.v1.id, 2).await;
        assert_eq!(f.client.view().item_count, 2);

        f.flaky.set_broken(true);
        f.client.add_to_cart(f.v2.id, 1).await;

        // The shopper still sees the cart they had, plus a retry prompt.
        assert_eq!(f.client.view().item_count, 2);
        assert_eq!(
            f.client.error(),
            Some("Could not add the item to your cart. Please try again.")
        );
    }

    #[tokio::test]
    async fn error_clears_once_an_operation_succeeds() {
        let mut f = fixture();
        f.client.initialize().await;

        f.flaky.set_broken(true);
        f.client.add_to_cart(f.v1.id, 1).await;
        assert!(f.client.error().is_some());

        f.flaky.set_broken(false);
        f.client.add_to_cart(f.v1.id, 1).await;

        assert!(f.client.error().is_none());
        assert_eq!(f.client.view().item_count, 1);
    }

    #[tokio::test]
    async fn validation_messages_reach_the_shopper_verbatim() {
        let mut f = fixture();
        f.client.initialize().await;
        f.client.add_to_cart(f.v1.id, 1).await;

        f.client.add_to_cart(f.v1.id, 0).await;

        assert_eq!(f.client.error(), Some("quantity must be at least 1, got 0"));
        // Nothing was written; the view still shows one unit.
        assert_eq!(f.client.view().item_count, 1);
    }

    #[tokio::test]
    async fn switching_identity_refetches_for_the_new_shopper() {
        let mut f = fixture();
        f.client.initialize().await;
        f.client.add_to_cart(f.v1.id, 2).await;

        // A different guest has their own, empty cart.
        f.client
            .switch_identity(ShopperIdentity::guest(GuestToken::mint()))
            .await;

        assert!(f.client.view().is_empty());
        assert!(f.client.error().is_none());
    }

    #[tokio::test]
    async fn reset_clears_view_and_error_without_touching_the_store() {
        let mut f = fixture();
        f.client.initialize().await;
        f.client.add_to_cart(f.v1.id, 2).await;
        f.flaky.set_broken(true);
        f.client.add_to_cart(f.v2.id, 1).await;
        assert!(f.client.error().is_some());

        f.client.reset();

        assert!(f.client.view().is_empty());
        assert!(f.client.error().is_none());

        // The stored cart survives; initialize brings it back.
        f.flaky.set_broken(false);
        f.client.initialize().await;
        assert_eq!(f.client.view().item_count, 2);
    }
}
