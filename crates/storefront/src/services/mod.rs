//! Business logic services for the storefront.
//!
//! Services sit between the HTTP layer and the store traits: routes parse
//! requests and translate errors, services own the rules. Each service is
//! a cheap-to-clone handle over `Arc<dyn Store>`.

pub mod auth;
pub mod cart;

pub use auth::{AuthError, AuthService};
pub use cart::{CartError, CartService, ClientCart, MergeOutcome};
