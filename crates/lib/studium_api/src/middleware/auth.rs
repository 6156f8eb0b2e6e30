//! Authentication middleware — Bearer token extraction and verification.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::AppState;
use studium_core::models::auth::TokenIdentity;

/// Identity stored in request extensions after successful verification.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub TokenIdentity);

/// Axum middleware: extracts `Authorization: Bearer <token>`, verifies the
/// access token, and injects [`AuthenticatedUser`] into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization scheme".into()))?;

    let identity = state.authority.verify_access_token(token)?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser(identity));

    Ok(next.run(request).await)
}
