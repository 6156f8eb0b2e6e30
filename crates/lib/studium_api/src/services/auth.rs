//! Authentication service — login/register flows delegating to
//! `studium_core::auth`.

use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{LogoutResponse, RefreshResponse, TokenResponse};
use crate::AppState;
use studium_core::auth::{jwt, password, queries};
use studium_core::models::auth::{TokenPair, User};

/// Minimum accepted password length.
const MIN_PASSWORD_LEN: usize = 8;

fn token_response(user: User, pair: TokenPair) -> TokenResponse {
    TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        expires_in: pair.expires_in,
        token_type: "Bearer".to_string(),
        user: user.into(),
    }
}

/// Authenticate with email + password.
pub async fn login(state: &AppState, email: &str, pass: &str) -> AppResult<TokenResponse> {
    let row = queries::find_user_by_email(&state.pool, email).await?;

    // Generic error whether the email or the password was wrong.
    let found = match row {
        None => return Err(AppError::Unauthorized("Invalid credentials".into())),
        Some(f) => f,
    };
    let password_hash = match found.password_hash {
        None => return Err(AppError::Unauthorized("Invalid credentials".into())),
        Some(h) => h,
    };

    if !password::verify_password(pass.to_string(), password_hash).await? {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let pair = state.authority.issue_token_pair(&found.user).await?;
    Ok(token_response(found.user, pair))
}

/// Register a new user account.
pub async fn register(
    state: &AppState,
    email: &str,
    pass: &str,
    name: Option<&str>,
) -> AppResult<TokenResponse> {
    if !email.contains('@') {
        return Err(AppError::Validation("Invalid email format".into()));
    }
    if pass.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }
    if queries::email_exists(&state.pool, email).await? {
        return Err(AppError::Validation("Email already registered".into()));
    }

    let password_hash = password::hash_password(pass.to_string(), state.config.bcrypt_cost).await?;
    let user_id = queries::create_user(&state.pool, email, name, &password_hash).await?;
    info!(email, "registered new user");

    let user = User {
        id: user_id,
        email: email.to_string(),
        name: name.map(|n| n.to_string()),
    };
    let pair = state.authority.issue_token_pair(&user).await?;
    Ok(token_response(user, pair))
}

/// Exchange a refresh token for a new pair (single-use rotation).
pub async fn refresh(state: &AppState, refresh_token: &str) -> AppResult<RefreshResponse> {
    let pair = state.authority.rotate_tokens(refresh_token).await?;
    Ok(RefreshResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        expires_in: pair.expires_in,
        token_type: "Bearer".to_string(),
    })
}

/// Logout — revoke a specific refresh token, if presented.
///
/// Lenient: a missing or unverifiable token still yields success, logout
/// must not fail because the session is already dead.
pub async fn logout(state: &AppState, refresh_token: Option<&str>) -> AppResult<LogoutResponse> {
    if let Some(token) = refresh_token {
        if let Ok(claims) = jwt::verify_refresh_token(token, state.config.jwt_secret.as_bytes()) {
            state.authority.revoke(&claims.sub, token).await?;
        }
    }
    Ok(LogoutResponse { success: true })
}

/// Logout all sessions — revoke every refresh token for a user.
pub async fn logout_all(state: &AppState, user_id: &str) -> AppResult<LogoutResponse> {
    state.authority.revoke_all(user_id).await?;
    Ok(LogoutResponse { success: true })
}
