//! Guest cart adoption on sign-in.
//!
//! When a shopper who has been browsing as a guest signs in (or signs up),
//! whatever they collected under the guest token moves to their account.
//! The guest session is retired in the same pass so the token cannot
//! resurrect the old cart.

use serde::Serialize;
use tracing::{info, instrument};

use treadline_core::{CartId, GuestToken, UserId};

use crate::db::RepositoryError;
use crate::models::{Cart, CartOwner};

use super::{CartError, CartService};

/// What a merge pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MergeOutcome {
    /// The request carried no guest token; there was nothing to look for.
    NoGuestToken,
    /// No signed-in user to merge into.
    NoUser,
    /// The token resolved to no cart. The session was still retired.
    NothingToMerge,
    /// The user had no cart, so the guest cart was handed over wholesale.
    /// Item ids are preserved.
    Reassigned { cart_id: CartId },
    /// Guest items were folded into the user's existing cart.
    Merged {
        /// Lines that landed as new rows in the user's cart.
        moved: usize,
        /// Lines whose quantity was added onto an existing row.
        combined: usize,
    },
}

impl CartService {
    /// Fold a guest's cart into a user's cart.
    ///
    /// Both identifiers are optional so callers can pass through whatever
    /// the request carried; absence of either side short-circuits to a
    /// no-op without touching the guest session. Once a token and user are
    /// both present the session is deleted regardless of whether a cart
    /// existed under it.
    ///
    /// Runs as a sequence of individually atomic store operations. If one
    /// fails the merge surfaces the error with the guest cart still intact,
    /// and signing in again retries it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Conflict`] if the user's carts changed under us
    /// mid-merge, or [`CartError::Repository`] if the store fails.
    #[instrument(skip(self))]
    pub async fn merge_guest_cart(
        &self,
        guest_token: Option<GuestToken>,
        user_id: Option<UserId>,
    ) -> Result<MergeOutcome, CartError> {
        let Some(token) = guest_token else {
            return Ok(MergeOutcome::NoGuestToken);
        };
        let Some(user_id) = user_id else {
            return Ok(MergeOutcome::NoUser);
        };

        let guest_owner = CartOwner::Guest(token);
        let Some(guest_cart) = self.store.find_cart(&guest_owner).await? else {
            self.store.delete_session(token).await?;
            return Ok(MergeOutcome::NothingToMerge);
        };

        let user_owner = CartOwner::User(user_id);
        let outcome = match self.store.find_cart(&user_owner).await? {
            None => self.reassign_or_merge(&guest_cart, &user_owner).await?,
            Some(user_cart) => self.merge_items(&guest_cart, &user_cart).await?,
        };

        self.store.delete_session(token).await?;
        self.views.invalidate(&guest_owner).await;
        self.views.invalidate(&user_owner).await;

        info!(?outcome, "guest cart merged");
        Ok(outcome)
    }

    /// Hand the guest cart over to the user by rewriting its owner. If the
    /// user acquired a cart between our lookup and the reassignment, fall
    /// back to an item-level merge into that cart.
    async fn reassign_or_merge(
        &self,
        guest_cart: &Cart,
        user_owner: &CartOwner,
    ) -> Result<MergeOutcome, CartError> {
        match self
            .store
            .reassign_cart_owner(guest_cart.id, user_owner)
            .await
        {
            Ok(()) => Ok(MergeOutcome::Reassigned {
                cart_id: guest_cart.id,
            }),
            Err(RepositoryError::Conflict(_)) => {
                let user_cart = self
                    .store
                    .find_cart(user_owner)
                    .await?
                    .ok_or_else(|| CartError::Conflict("user cart changed during merge".into()))?;
                self.merge_items(guest_cart, &user_cart).await
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Move every guest line into the user's cart, summing quantities where
    /// the user already has the variant, then drop the emptied guest cart.
    async fn merge_items(
        &self,
        guest_cart: &Cart,
        user_cart: &Cart,
    ) -> Result<MergeOutcome, CartError> {
        let mut moved = 0;
        let mut combined = 0;

        for item in self.store.cart_items(guest_cart.id).await? {
            let merged = self
                .store
                .upsert_item(user_cart.id, item.product_variant_id, item.quantity.get())
                .await?;

            if merged.quantity == item.quantity {
                moved += 1;
            } else {
                combined += 1;
            }
        }

        self.store.delete_cart(guest_cart.id).await?;
        Ok(MergeOutcome::Merged { moved, combined })
    }
}
