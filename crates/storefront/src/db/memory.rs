//! HashMap-backed [`Store`] for tests and local development.
//!
//! Mirrors the `PostgreSQL` semantics closely enough that service tests can
//! run against it: the same conflict, not-found, and validation outcomes,
//! with one lock guarding all entities so cross-entity operations stay
//! atomic the way single SQL statements are.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use treadline_core::{
    CartId, CartItemId, Email, GuestToken, ProductId, Quantity, UserId, VariantId,
};

use super::store::{CartRepo, CatalogRepo, GuestSessionRepo, Store, UserRepo};
use super::RepositoryError;
use crate::models::{
    Cart, CartItem, CartLine, CartOwner, GUEST_SESSION_TTL_DAYS, GuestSession, Product, User,
    VariantSummary,
};

struct UserRecord {
    user: User,
    password_hash: String,
}

struct VariantRecord {
    product_id: ProductId,
    color: String,
    size: String,
}

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, UserRecord>,
    sessions: HashMap<GuestToken, GuestSession>,
    carts: HashMap<CartId, Cart>,
    items: HashMap<CartItemId, CartItem>,
    products: HashMap<ProductId, Product>,
    variants: HashMap<VariantId, VariantRecord>,
}

/// In-memory store backed by a single `RwLock`. Clone-friendly via `Arc`.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, RepositoryError> {
        self.inner
            .read()
            .map_err(|_| RepositoryError::LockPoisoned("memory store"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, RepositoryError> {
        self.inner
            .write()
            .map_err(|_| RepositoryError::LockPoisoned("memory store"))
    }

    /// Seed a product with no description or thumbnail.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::LockPoisoned`] if the store lock is poisoned.
    pub fn add_product(&self, name: &str, price: Decimal) -> Result<Product, RepositoryError> {
        let product = Product {
            id: ProductId::generate(),
            name: name.to_owned(),
            description: None,
            price,
            thumbnail: None,
        };

        self.write()?.products.insert(product.id, product.clone());
        Ok(product)
    }

    /// Seed a color/size variant of an existing product.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if the product does not exist.
    pub fn add_variant(
        &self,
        product_id: ProductId,
        color: &str,
        size: &str,
    ) -> Result<VariantSummary, RepositoryError> {
        let mut inner = self.write()?;

        if !inner.products.contains_key(&product_id) {
            return Err(RepositoryError::NotFound);
        }

        let id = VariantId::generate();
        inner.variants.insert(
            id,
            VariantRecord {
                product_id,
                color: color.to_owned(),
                size: size.to_owned(),
            },
        );

        Ok(VariantSummary {
            id,
            color: color.to_owned(),
            size: size.to_owned(),
        })
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create_user(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut inner = self.write()?;

        if inner
            .users
            .values()
            .any(|r| r.user.email.as_str() == email.as_str())
        {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let now = Utc::now();
        let user = User {
            id: UserId::generate(),
            name: name.to_owned(),
            email: email.clone(),
            created_at: now,
            updated_at: now,
        };

        inner.users.insert(
            user.id,
            UserRecord {
                user: user.clone(),
                password_hash: password_hash.to_owned(),
            },
        );

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let inner = self.read()?;
        Ok(inner
            .users
            .values()
            .find(|r| r.user.email.as_str() == email.as_str())
            .map(|r| r.user.clone()))
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let inner = self.read()?;
        Ok(inner.users.get(&id).map(|r| r.user.clone()))
    }

    async fn password_hash_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let inner = self.read()?;
        Ok(inner
            .users
            .values()
            .find(|r| r.user.email.as_str() == email.as_str())
            .map(|r| (r.user.clone(), r.password_hash.clone())))
    }
}

#[async_trait]
impl GuestSessionRepo for MemoryStore {
    async fn get_or_create_session(
        &self,
        presented: Option<GuestToken>,
    ) -> Result<GuestSession, RepositoryError> {
        let mut inner = self.write()?;
        let now = Utc::now();

        if let Some(token) = presented
            && let Some(session) = inner.sessions.get(&token)
        {
            if session.is_expired(now) {
                inner.sessions.remove(&token);
            } else {
                return Ok(session.clone());
            }
        }

        let session = GuestSession {
            token: GuestToken::mint(),
            expires_at: now + Duration::days(GUEST_SESSION_TTL_DAYS),
            created_at: now,
        };
        inner.sessions.insert(session.token, session.clone());

        Ok(session)
    }

    async fn delete_session(&self, token: GuestToken) -> Result<(), RepositoryError> {
        self.write()?.sessions.remove(&token);
        Ok(())
    }

    async fn delete_expired_sessions(&self) -> Result<u64, RepositoryError> {
        let mut inner = self.write()?;
        let now = Utc::now();

        let before = inner.sessions.len();
        inner.sessions.retain(|_, s| !s.is_expired(now));

        Ok(u64::try_from(before - inner.sessions.len()).unwrap_or(u64::MAX))
    }
}

#[async_trait]
impl CartRepo for MemoryStore {
    async fn find_cart(&self, owner: &CartOwner) -> Result<Option<Cart>, RepositoryError> {
        let inner = self.read()?;
        Ok(inner.carts.values().find(|c| c.owner == *owner).cloned())
    }

    async fn find_cart_by_id(&self, cart_id: CartId) -> Result<Option<Cart>, RepositoryError> {
        let inner = self.read()?;
        Ok(inner.carts.get(&cart_id).cloned())
    }

    async fn create_cart(&self, owner: &CartOwner) -> Result<Cart, RepositoryError> {
        let mut inner = self.write()?;

        if inner.carts.values().any(|c| c.owner == *owner) {
            return Err(RepositoryError::Conflict(
                "owner already has a cart".to_owned(),
            ));
        }

        let now = Utc::now();
        let cart = Cart {
            id: CartId::generate(),
            owner: *owner,
            created_at: now,
            updated_at: now,
        };
        inner.carts.insert(cart.id, cart.clone());

        Ok(cart)
    }

    async fn find_or_create_cart(&self, owner: &CartOwner) -> Result<Cart, RepositoryError> {
        let mut inner = self.write()?;

        if let Some(cart) = inner.carts.values().find(|c| c.owner == *owner) {
            return Ok(cart.clone());
        }

        let now = Utc::now();
        let cart = Cart {
            id: CartId::generate(),
            owner: *owner,
            created_at: now,
            updated_at: now,
        };
        inner.carts.insert(cart.id, cart.clone());

        Ok(cart)
    }

    async fn cart_items(&self, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError> {
        let inner = self.read()?;

        let mut items: Vec<CartItem> = inner
            .items
            .values()
            .filter(|it| it.cart_id == cart_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.as_uuid().cmp(&b.id.as_uuid()))
        });

        Ok(items)
    }

    async fn cart_lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let items = self.cart_items(cart_id).await?;
        let inner = self.read()?;

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let variant = inner.variants.get(&item.product_variant_id).ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "cart item references unknown variant {}",
                    item.product_variant_id
                ))
            })?;
            let product = inner.products.get(&variant.product_id).ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "variant references unknown product {}",
                    variant.product_id
                ))
            })?;

            lines.push(CartLine {
                item_id: item.id,
                product_variant_id: item.product_variant_id,
                quantity: item.quantity,
                product_name: product.name.clone(),
                unit_price: product.price,
                thumbnail: product.thumbnail.clone(),
                color: variant.color.clone(),
                size: variant.size.clone(),
            });
        }

        Ok(lines)
    }

    async fn upsert_item(
        &self,
        cart_id: CartId,
        variant_id: VariantId,
        delta: i32,
    ) -> Result<CartItem, RepositoryError> {
        let mut inner = self.write()?;

        if !inner.carts.contains_key(&cart_id) {
            return Err(RepositoryError::NotFound);
        }
        if !inner.variants.contains_key(&variant_id) {
            return Err(RepositoryError::NotFound);
        }

        let now = Utc::now();

        if let Some(item) = inner
            .items
            .values_mut()
            .find(|it| it.cart_id == cart_id && it.product_variant_id == variant_id)
        {
            let next = item.quantity.get() + delta;
            let quantity = Quantity::new(next).map_err(|_| {
                RepositoryError::Validation("item quantity must stay at least 1".to_owned())
            })?;

            item.quantity = quantity;
            item.updated_at = now;
            return Ok(item.clone());
        }

        let quantity = Quantity::new(delta).map_err(|_| {
            RepositoryError::Validation("item quantity must stay at least 1".to_owned())
        })?;

        let item = CartItem {
            id: CartItemId::generate(),
            cart_id,
            product_variant_id: variant_id,
            quantity,
            created_at: now,
            updated_at: now,
        };
        inner.items.insert(item.id, item.clone());

        Ok(item)
    }

    async fn set_item_quantity(
        &self,
        item_id: CartItemId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        let mut inner = self.write()?;

        let item = inner.items.get_mut(&item_id).ok_or(RepositoryError::NotFound)?;
        item.quantity = quantity;
        item.updated_at = Utc::now();

        Ok(item.clone())
    }

    async fn remove_item(&self, item_id: CartItemId) -> Result<Option<CartId>, RepositoryError> {
        Ok(self.write()?.items.remove(&item_id).map(|it| it.cart_id))
    }

    async fn clear_cart(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        self.write()?.items.retain(|_, it| it.cart_id != cart_id);
        Ok(())
    }

    async fn reassign_cart_owner(
        &self,
        cart_id: CartId,
        owner: &CartOwner,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.write()?;

        // Same order as Postgres: the unique index trips during the row
        // update, before the foreign key trigger fires.
        if inner
            .carts
            .values()
            .any(|c| c.owner == *owner && c.id != cart_id)
        {
            return Err(RepositoryError::Conflict(
                "new owner already has a cart".to_owned(),
            ));
        }

        if let CartOwner::User(user_id) = owner
            && !inner.users.contains_key(user_id)
        {
            return Err(RepositoryError::NotFound);
        }

        let cart = inner.carts.get_mut(&cart_id).ok_or(RepositoryError::NotFound)?;
        cart.owner = *owner;
        cart.updated_at = Utc::now();

        Ok(())
    }

    async fn delete_cart(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        let mut inner = self.write()?;
        inner.carts.remove(&cart_id);
        inner.items.retain(|_, it| it.cart_id != cart_id);
        Ok(())
    }
}

#[async_trait]
impl CatalogRepo for MemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let inner = self.read()?;

        let mut products: Vec<Product> = inner.products.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(products)
    }

    async fn list_variants(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<VariantSummary>, RepositoryError> {
        let inner = self.read()?;

        let mut variants: Vec<VariantSummary> = inner
            .variants
            .iter()
            .filter(|(_, v)| v.product_id == product_id)
            .map(|(id, v)| VariantSummary {
                id: *id,
                color: v.color.clone(),
                size: v.size.clone(),
            })
            .collect();
        variants.sort_by(|a, b| a.color.cmp(&b.color).then_with(|| a.size.cmp(&b.size)));

        Ok(variants)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), RepositoryError> {
        self.read().map(|_| ())
    }
}
