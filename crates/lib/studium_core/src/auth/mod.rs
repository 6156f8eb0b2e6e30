//! Authentication and session logic.
//!
//! Provides password hashing, JWT management, the refresh-token record
//! store, and the `SessionAuthority` that ties them together.

pub mod jwt;
pub mod password;
pub mod queries;
pub mod session;
pub mod store;

use thiserror::Error;

/// Authentication errors.
///
/// Signature, issuer/audience, expiry, and revocation failures all collapse
/// into `InvalidToken` so callers cannot tell which check rejected a token.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
