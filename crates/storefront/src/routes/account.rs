//! Account route handlers.
//!
//! These routes require authentication.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::models::User;
use crate::state::AppState;

/// The signed-in user's profile.
///
/// GET /account
///
/// The session only proves who the shopper is; the profile itself is read
/// fresh from the store.
///
/// # Errors
///
/// Returns 401 when not signed in, or when the account behind the session
/// no longer exists.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<User>, AppError> {
    let user = state.auth().get_user(user.id).await?;
    Ok(Json(user))
}
