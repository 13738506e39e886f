//! Cart repository implementation for [`PgStore`].
//!
//! Quantity arithmetic happens inside single SQL statements so that two
//! requests adding the same variant at the same time can never lose an
//! update to a read-modify-write race. The `quantity >= 1` CHECK on the
//! item table is the backstop that turns an underflowing decrement into a
//! validation error instead of a corrupt row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use treadline_core::{CartId, CartItemId, GuestToken, Quantity, UserId, VariantId};

use super::store::CartRepo;
use super::{PgStore, RepositoryError};
use crate::models::{Cart, CartItem, CartLine, CartOwner};

/// Raw cart row. The nullable owner pair collapses into [`CartOwner`].
#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: Option<UserId>,
    guest_token: Option<GuestToken>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CartRow {
    fn into_cart(self) -> Result<Cart, RepositoryError> {
        let owner = CartOwner::from_columns(self.user_id, self.guest_token)
            .map_err(|e| RepositoryError::DataCorruption(format!("cart {}: {e}", self.id)))?;

        Ok(Cart {
            id: self.id,
            owner,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl CartRepo for PgStore {
    async fn find_cart(&self, owner: &CartOwner) -> Result<Option<Cart>, RepositoryError> {
        // Exactly one bind is non-null, and `col = NULL` never matches,
        // so the OR selects on whichever owner column applies.
        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, user_id, guest_token, created_at, updated_at
            FROM storefront.cart
            WHERE user_id = $1 OR guest_token = $2
            ",
        )
        .bind(owner.user_id())
        .bind(owner.guest_token())
        .fetch_optional(self.pool())
        .await?;

        row.map(CartRow::into_cart).transpose()
    }

    async fn find_cart_by_id(&self, cart_id: CartId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, user_id, guest_token, created_at, updated_at
            FROM storefront.cart
            WHERE id = $1
            ",
        )
        .bind(cart_id)
        .fetch_optional(self.pool())
        .await?;

        row.map(CartRow::into_cart).transpose()
    }

    async fn create_cart(&self, owner: &CartOwner) -> Result<Cart, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            INSERT INTO storefront.cart (user_id, guest_token)
            VALUES ($1, $2)
            RETURNING id, user_id, guest_token, created_at, updated_at
            ",
        )
        .bind(owner.user_id())
        .bind(owner.guest_token())
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("owner already has a cart".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.into_cart()
    }

    async fn find_or_create_cart(&self, owner: &CartOwner) -> Result<Cart, RepositoryError> {
        let inserted = sqlx::query_as::<_, CartRow>(
            r"
            INSERT INTO storefront.cart (user_id, guest_token)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            RETURNING id, user_id, guest_token, created_at, updated_at
            ",
        )
        .bind(owner.user_id())
        .bind(owner.guest_token())
        .fetch_optional(self.pool())
        .await?;

        if let Some(row) = inserted {
            return row.into_cart();
        }

        // The insert lost a race to another request; the winner's cart is
        // the one to use. A None here means the cart vanished in between,
        // which callers treat the same as any other missing cart.
        match self.find_cart(owner).await? {
            Some(cart) => Ok(cart),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn cart_items(&self, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError> {
        let items = sqlx::query_as::<_, CartItem>(
            r"
            SELECT id, cart_id, product_variant_id, quantity, created_at, updated_at
            FROM storefront.cart_item
            WHERE cart_id = $1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(cart_id)
        .fetch_all(self.pool())
        .await?;

        Ok(items)
    }

    async fn cart_lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLine>(
            r"
            SELECT ci.id AS item_id,
                   ci.product_variant_id,
                   ci.quantity,
                   p.name AS product_name,
                   p.price AS unit_price,
                   p.thumbnail,
                   c.name AS color,
                   s.label AS size
            FROM storefront.cart_item ci
            JOIN storefront.product_variant v ON v.id = ci.product_variant_id
            JOIN storefront.product p ON p.id = v.product_id
            JOIN storefront.color c ON c.id = v.color_id
            JOIN storefront.size s ON s.id = v.size_id
            WHERE ci.cart_id = $1
            ORDER BY ci.created_at ASC, ci.id ASC
            ",
        )
        .bind(cart_id)
        .fetch_all(self.pool())
        .await?;

        Ok(lines)
    }

    async fn upsert_item(
        &self,
        cart_id: CartId,
        variant_id: VariantId,
        delta: i32,
    ) -> Result<CartItem, RepositoryError> {
        let item = sqlx::query_as::<_, CartItem>(
            r"
            INSERT INTO storefront.cart_item (cart_id, product_variant_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (cart_id, product_variant_id)
            DO UPDATE SET quantity = cart_item.quantity + EXCLUDED.quantity,
                          updated_at = now()
            RETURNING id, cart_id, product_variant_id, quantity, created_at, updated_at
            ",
        )
        .bind(cart_id)
        .bind(variant_id)
        .bind(delta)
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_check_violation() {
                    return RepositoryError::Validation(
                        "item quantity must stay at least 1".to_owned(),
                    );
                }
                if db_err.is_foreign_key_violation() {
                    return RepositoryError::NotFound;
                }
            }
            RepositoryError::Database(e)
        })?;

        Ok(item)
    }

    async fn set_item_quantity(
        &self,
        item_id: CartItemId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        let item = sqlx::query_as::<_, CartItem>(
            r"
            UPDATE storefront.cart_item
            SET quantity = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, cart_id, product_variant_id, quantity, created_at, updated_at
            ",
        )
        .bind(item_id)
        .bind(quantity)
        .fetch_optional(self.pool())
        .await?;

        item.ok_or(RepositoryError::NotFound)
    }

    async fn remove_item(&self, item_id: CartItemId) -> Result<Option<CartId>, RepositoryError> {
        let cart_id = sqlx::query_scalar::<_, CartId>(
            r"
            DELETE FROM storefront.cart_item
            WHERE id = $1
            RETURNING cart_id
            ",
        )
        .bind(item_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(cart_id)
    }

    async fn clear_cart(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            DELETE FROM storefront.cart_item
            WHERE cart_id = $1
            ",
        )
        .bind(cart_id)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn reassign_cart_owner(
        &self,
        cart_id: CartId,
        owner: &CartOwner,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.cart
            SET user_id = $2, guest_token = $3, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(cart_id)
        .bind(owner.user_id())
        .bind(owner.guest_token())
        .execute(self.pool())
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return RepositoryError::Conflict("new owner already has a cart".to_owned());
                }
                // The new owner's user row must exist.
                if db_err.is_foreign_key_violation() {
                    return RepositoryError::NotFound;
                }
            }
            RepositoryError::Database(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete_cart(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            DELETE FROM storefront.cart
            WHERE id = $1
            ",
        )
        .bind(cart_id)
        .execute(self.pool())
        .await?;

        Ok(())
    }
}
