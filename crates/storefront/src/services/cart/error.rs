//! Cart error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Malformed input, rejected before any persistence call.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced cart, item, or variant does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A uniqueness race, such as two requests creating the same owner's cart.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A mutation was attempted with no user or guest identity on the request.
    #[error("no shopper identity on request")]
    MissingIdentity,

    /// The backing store failed.
    #[error("storage error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for CartError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Validation(msg) => Self::Validation(msg),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            // NotFound stays un-mapped here: only the call site knows which
            // entity was missing, so it converts explicitly.
            other => Self::Repository(other),
        }
    }
}
