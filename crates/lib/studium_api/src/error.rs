//! Application error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;
use studium_core::auth::AuthError;
use studium_core::keys::KeysError;
use studium_core::vault::VaultError;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.as_str()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.as_str()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.as_str()),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error",
            ),
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("row not found".into()),
            _ => AppError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidToken => AppError::Unauthorized("Invalid or expired token".into()),
            AuthError::UserNotFound => AppError::Unauthorized("User not found".into()),
            AuthError::Storage(e) => AppError::from(e),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<VaultError> for AppError {
    fn from(e: VaultError) -> Self {
        // Cryptographic failures mean the stored data is unusable; nothing
        // a client can do differently, so they surface as 500s.
        AppError::Internal(e.to_string())
    }
}

impl From<KeysError> for AppError {
    fn from(e: KeysError) -> Self {
        match e {
            KeysError::Validation(msg) => AppError::Validation(msg),
            KeysError::NotFound(msg) => AppError::NotFound(msg),
            KeysError::LimitExceeded(n) => {
                AppError::Validation(format!("Maximum of {n} API keys allowed per user"))
            }
            KeysError::Vault(e) => AppError::from(e),
            KeysError::Storage(e) => AppError::from(e),
            KeysError::Internal(msg) => AppError::Internal(msg),
        }
    }
}
