//! Authentication request handlers.

use axum::extract::State;
use axum::{Extension, Json};

use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    AuthUser, LoginRequest, LogoutRequest, LogoutResponse, RefreshRequest, RefreshResponse,
    RegisterRequest, TokenResponse,
};
use crate::services::auth;
use crate::AppState;

/// `POST /api/auth/login` — authenticate with email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::login(&state, &body.email, &body.password).await?;
    Ok(Json(resp))
}

/// `POST /api/auth/register` — create a new user account.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::register(&state, &body.email, &body.password, body.name.as_deref()).await?;
    Ok(Json(resp))
}

/// `POST /api/auth/refresh` — exchange a refresh token for a new pair.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<RefreshResponse>> {
    let resp = auth::refresh(&state, &body.refresh_token).await?;
    Ok(Json(resp))
}

/// `POST /api/auth/logout` — revoke a refresh token.
pub async fn logout_handler(
    State(state): State<AppState>,
    Json(body): Json<LogoutRequest>,
) -> AppResult<Json<LogoutResponse>> {
    let resp = auth::logout(&state, body.refresh_token.as_deref()).await?;
    Ok(Json(resp))
}

/// `POST /api/auth/logout-all` — revoke every session for the caller.
pub async fn logout_all_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(identity)): Extension<AuthenticatedUser>,
) -> AppResult<Json<LogoutResponse>> {
    let resp = auth::logout_all(&state, &identity.user_id).await?;
    Ok(Json(resp))
}

/// `GET /api/auth/me` — identity proven by the presented access token.
pub async fn me_handler(
    Extension(AuthenticatedUser(identity)): Extension<AuthenticatedUser>,
) -> Json<AuthUser> {
    Json(AuthUser {
        id: identity.user_id,
        email: identity.email,
        name: identity.name,
    })
}
