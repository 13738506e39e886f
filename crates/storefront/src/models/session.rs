//! Session-related types.
//!
//! Types stored in the session for authentication state, plus the guest
//! session row that backs anonymous carts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use treadline_core::{Email, GuestToken, UserId};

/// How long a guest session stays valid without the guest signing in.
pub const GUEST_SESSION_TTL_DAYS: i64 = 7;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's display name.
    pub name: String,
    /// User's email address.
    pub email: Email,
}

/// A guest session row.
///
/// The token doubles as the bearer credential for the guest's cart, so rows
/// are deleted outright on expiry or merge rather than soft-deleted.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GuestSession {
    /// The token identifying this session.
    pub token: GuestToken,
    /// When the session stops being honored.
    pub expires_at: DateTime<Utc>,
    /// When the session was minted.
    pub created_at: DateTime<Utc>,
}

impl GuestSession {
    /// Whether the session has passed its expiry.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for storing the anonymous guest token.
    pub const GUEST_TOKEN: &str = "guest_token";
}
