//! Domain models for the storefront.
//!
//! Row types derive `sqlx::FromRow` where they map one-to-one onto a table;
//! assembled types like [`CartView`] are built in the service layer from
//! joined queries and carry derived data only.

pub mod cart;
pub mod catalog;
pub mod session;
pub mod user;

pub use cart::{Cart, CartItem, CartLine, CartOwner, CartOwnerError, CartView, ShopperIdentity};
pub use catalog::{Product, VariantSummary};
pub use session::{CurrentUser, GUEST_SESSION_TTL_DAYS, GuestSession, keys as session_keys};
pub use user::User;
