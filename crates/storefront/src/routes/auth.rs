//! Authentication route handlers.
//!
//! Sign-up and sign-in both end the same way: the user lands in the
//! session, and whatever cart they built as a guest is folded into their
//! account. The guest token is dropped from the session once consumed, so
//! a later sign-out cannot resurrect the merged-away guest cart.

use axum::{Json, http::StatusCode};
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use treadline_core::GuestToken;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{
    RequireUser, Shopper, clear_current_user, forget_guest_token, set_current_user,
};
use crate::models::{CurrentUser, User};
use crate::services::cart::MergeOutcome;
use crate::state::AppState;

/// Sign-up request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Sign-in request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for a sign-up or sign-in that established a session.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: CurrentUser,
    pub cart_merge: MergeOutcome,
}

fn current_user(user: &User) -> CurrentUser {
    CurrentUser {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
    }
}

/// Establish the signed-in session and fold in the guest cart.
///
/// The session write happens first: if the merge then fails, the shopper
/// is still signed in, the guest cart is untouched, and the next sign-in
/// retries the merge.
async fn establish_session(
    state: &AppState,
    session: &Session,
    user: &User,
    guest_token: Option<GuestToken>,
) -> Result<SessionResponse, AppError> {
    let current = current_user(user);
    set_current_user(session, &current).await?;

    let outcome = state
        .cart()
        .merge_guest_cart(guest_token, Some(user.id))
        .await?;
    if !matches!(outcome, MergeOutcome::NoGuestToken) {
        forget_guest_token(session).await?;
    }

    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok(SessionResponse {
        user: current,
        cart_merge: outcome,
    })
}

/// Create an account and sign in.
///
/// POST /auth/register
///
/// # Errors
///
/// Returns 400 for a rejected name, email, or password and 409 if the
/// email is already registered.
#[instrument(skip(state, session, identity, body))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Shopper(identity): Shopper,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let user = state
        .auth()
        .sign_up(&body.name, &body.email, &body.password)
        .await?;
    tracing::info!(user_id = %user.id, "account created");

    let response = establish_session(&state, &session, &user, identity.guest_token).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Sign in with email and password.
///
/// POST /auth/login
///
/// # Errors
///
/// Returns 401 for bad credentials; the response does not reveal whether
/// the account exists.
#[instrument(skip(state, session, identity, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Shopper(identity): Shopper,
    Json(body): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let user = state.auth().sign_in(&body.email, &body.password).await?;

    let response = establish_session(&state, &session, &user, identity.guest_token).await?;
    Ok(Json(response))
}

/// Fold the session's guest cart into the signed-in user's cart.
///
/// POST /auth/merge-cart
///
/// Sign-up and sign-in already run this fold. The explicit endpoint is
/// the retry path for a session whose merge failed during sign-in and
/// for clients that authenticate out of band but still hold a guest
/// token here.
///
/// # Errors
///
/// Returns 401 when no user is signed in.
#[instrument(skip(state, session, user, identity))]
pub async fn merge_cart(
    State(state): State<AppState>,
    session: Session,
    RequireUser(user): RequireUser,
    Shopper(identity): Shopper,
) -> Result<Json<MergeOutcome>, AppError> {
    let outcome = state
        .cart()
        .merge_guest_cart(identity.guest_token, Some(user.id))
        .await?;
    if !matches!(outcome, MergeOutcome::NoGuestToken) {
        forget_guest_token(&session).await?;
    }

    Ok(Json(outcome))
}

/// Sign out.
///
/// POST /auth/logout
///
/// Destroys the whole session. The next request starts from nothing: no
/// user, no guest token.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> StatusCode {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {e}");
    }

    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {e}");
    }

    clear_sentry_user();

    StatusCode::NO_CONTENT
}
