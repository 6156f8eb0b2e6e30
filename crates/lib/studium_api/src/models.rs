//! API request/response types.

use serde::{Deserialize, Serialize};

use studium_core::models::auth::User;
use studium_core::models::keys::{ApiKeyRecord, Provider};

/// `POST /api/auth/login` request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /api/auth/register` request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// `POST /api/auth/refresh` request body.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// `POST /api/auth/logout` request body.
#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

/// User as exposed over the wire.
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}

impl From<User> for AuthUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
        }
    }
}

/// Token pair plus user, returned by login and register.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
    pub user: AuthUser,
}

/// Token pair returned by refresh (no user payload, matching the original
/// contract).
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

/// Logout acknowledgement.
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// Deletion acknowledgement.
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
}

/// `POST /api/user/keys` request body.
#[derive(Debug, Deserialize)]
pub struct ApiKeyRequest {
    pub provider: Provider,
    pub api_key: String,
}

/// Display-safe API key, as listed and returned on creation.
#[derive(Debug, Serialize)]
pub struct ApiKeyResponse {
    pub id: String,
    pub provider: Provider,
    pub key_prefix: String,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<ApiKeyRecord> for ApiKeyResponse {
    fn from(r: ApiKeyRecord) -> Self {
        Self {
            id: r.id,
            provider: r.provider,
            key_prefix: r.key_prefix,
            is_active: r.is_active,
            created_at: r.created_at,
        }
    }
}

/// `GET /api/health` response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub db_connected: bool,
}

/// Error body shared by all failure responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
