//! API-key request handlers. All routes require authentication.

use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{ApiKeyRequest, ApiKeyResponse, DeletedResponse};
use crate::AppState;
use studium_core::keys;

/// `POST /api/user/keys` — validate, encrypt, and store a provider key.
pub async fn add_key_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(identity)): Extension<AuthenticatedUser>,
    Json(body): Json<ApiKeyRequest>,
) -> AppResult<Json<ApiKeyResponse>> {
    let record = keys::add_api_key(
        &state.pool,
        &state.vault,
        &identity.user_id,
        body.provider,
        &body.api_key,
    )
    .await?;
    Ok(Json(record.into()))
}

/// `GET /api/user/keys` — list the caller's keys, display-safe fields only.
pub async fn list_keys_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(identity)): Extension<AuthenticatedUser>,
) -> AppResult<Json<Vec<ApiKeyResponse>>> {
    let records = keys::list_api_keys(&state.pool, &identity.user_id).await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

/// `DELETE /api/user/keys/{id}` — remove one of the caller's keys.
pub async fn delete_key_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(identity)): Extension<AuthenticatedUser>,
    Path(key_id): Path<String>,
) -> AppResult<Json<DeletedResponse>> {
    keys::delete_api_key(&state.pool, &identity.user_id, &key_id).await?;
    Ok(Json(DeletedResponse { success: true }))
}
