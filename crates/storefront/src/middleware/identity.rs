//! Shopper identity extractors and session helpers.
//!
//! Everything in this module is glue between the session cookie and the
//! identity values the services take. Handlers extract a [`Shopper`] (or a
//! [`RequireUser`] where sign-in is mandatory) and hand the identity on;
//! the helpers below are the only code that writes identity into a session.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use tower_sessions::Session;

use treadline_core::GuestToken;

use crate::db::Store;
use crate::error::AppError;
use crate::models::{CurrentUser, ShopperIdentity, session_keys};

/// Extractor yielding whatever identity the request carries.
///
/// Never rejects: a request with no session or a fresh cookie simply gets
/// an empty identity. A signed-in user who still has a guest token in the
/// session gets both, and the services resolve the precedence.
///
/// # Example
///
/// ```rust,ignore
/// async fn show_cart(
///     State(state): State<AppState>,
///     Shopper(identity): Shopper,
/// ) -> Result<Json<CartView>, AppError> {
///     Ok(Json(state.cart().view(identity).await?.as_ref().clone()))
/// }
/// ```
pub struct Shopper(pub ShopperIdentity);

impl<S> FromRequestParts<S> for Shopper
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self(ShopperIdentity::default()));
        };

        let user: Option<CurrentUser> = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();
        let guest_token: Option<GuestToken> = session
            .get(session_keys::GUEST_TOKEN)
            .await
            .ok()
            .flatten();

        Ok(Self(ShopperIdentity {
            user_id: user.map(|u| u.id),
            guest_token,
        }))
    }
}

/// Extractor that requires a signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn account(RequireUser(user): RequireUser) -> Json<AccountResponse> {
///     Json(AccountResponse::from(user))
/// }
/// ```
pub struct RequireUser(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Unauthorized("sign in required".to_owned()))?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| AppError::Unauthorized("sign in required".to_owned()))?;

        Ok(Self(user))
    }
}

/// Resolve the session's guest token to a live one, minting and storing a
/// fresh token when the session has none or holds a dead one.
///
/// Mutating cart handlers call this before acting for a shopper who is not
/// signed in, so the token they act under always references a live guest
/// session row. Read-only handlers skip it; reads never mint sessions.
///
/// # Errors
///
/// Returns [`AppError::Database`] if the store fails or
/// [`AppError::Session`] if the token cannot be written back.
pub async fn ensure_guest_token(
    session: &Session,
    store: &dyn Store,
) -> Result<GuestToken, AppError> {
    let presented: Option<GuestToken> = session.get(session_keys::GUEST_TOKEN).await?;

    let guest_session = store.get_or_create_session(presented).await?;
    if presented != Some(guest_session.token) {
        session
            .insert(session_keys::GUEST_TOKEN, guest_session.token)
            .await?;
    }

    Ok(guest_session.token)
}

/// Store the signed-in user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Remove the signed-in user from the session (sign-out).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}

/// Drop the guest token from the session, once it has been merged away.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn forget_guest_token(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<GuestToken>(session_keys::GUEST_TOKEN)
        .await?;
    Ok(())
}
