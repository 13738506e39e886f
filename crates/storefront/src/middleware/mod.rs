//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)
//! 4. Rate limiting (governor, applied per route group)
//!
//! The session cookie is transport: route handlers read identity through
//! the [`Shopper`] extractor and pass it to services as a value, so the
//! services never see a cookie or a `Session`.

pub mod identity;
pub mod rate_limit;
pub mod session;

pub use identity::{
    RequireUser, Shopper, clear_current_user, ensure_guest_token, forget_guest_token,
    set_current_user,
};
pub use rate_limit::{auth_rate_limiter, cart_rate_limiter};
pub use session::create_session_layer;
