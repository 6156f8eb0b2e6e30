//! Per-user AI API-key management.
//!
//! Stores provider keys encrypted by the [`crate::vault`], with a display
//! prefix and active flag. Plaintext is only produced on demand for the
//! AI callers and never cached.

pub mod queries;

use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use crate::models::keys::{ApiKeyRecord, Provider};
use crate::vault::{self, CredentialVault, VaultError};

/// Maximum number of active API keys per user.
pub const MAX_API_KEYS_PER_USER: i64 = 5;

/// API-key management errors.
#[derive(Debug, Error)]
pub enum KeysError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Maximum of {0} API keys allowed per user")]
    LimitExceeded(i64),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Encrypt and store an API key for a user.
///
/// Re-adding a key for a provider replaces the existing one; keys are
/// never mutated in place.
pub async fn add_api_key(
    pool: &PgPool,
    vault: &CredentialVault,
    user_id: &str,
    provider: Provider,
    api_key: &str,
) -> Result<ApiKeyRecord, KeysError> {
    if !vault::validate_format(api_key, provider) {
        return Err(KeysError::Validation(format!(
            "The provided API key is not valid for {provider}"
        )));
    }

    queries::delete_keys_for_provider(pool, user_id, provider).await?;

    let active = queries::count_active_keys(pool, user_id).await?;
    if active >= MAX_API_KEYS_PER_USER {
        return Err(KeysError::LimitExceeded(MAX_API_KEYS_PER_USER));
    }

    let encrypted = vault.encrypt_for_storage(api_key)?;
    let prefix = vault::key_prefix(api_key);
    let record = queries::insert_api_key(pool, user_id, provider, &encrypted, &prefix).await?;

    info!(user_id, provider = %provider, "stored encrypted API key");
    Ok(record)
}

/// List a user's API keys, display-safe fields only.
pub async fn list_api_keys(pool: &PgPool, user_id: &str) -> Result<Vec<ApiKeyRecord>, KeysError> {
    queries::list_api_keys(pool, user_id).await
}

/// Delete one of the user's API keys.
pub async fn delete_api_key(pool: &PgPool, user_id: &str, key_id: &str) -> Result<(), KeysError> {
    // A non-UUID id can't name a stored key; don't let it reach the cast.
    if uuid::Uuid::parse_str(key_id).is_err() {
        return Err(KeysError::NotFound(format!("API key {key_id}")));
    }
    if !queries::delete_api_key(pool, user_id, key_id).await? {
        return Err(KeysError::NotFound(format!("API key {key_id}")));
    }
    info!(user_id, key_id, "deleted API key");
    Ok(())
}

/// Decrypt-on-demand: fetch and decrypt the user's active key for a
/// provider. Returns `None` when no key is configured.
pub async fn decrypted_key(
    pool: &PgPool,
    vault: &CredentialVault,
    user_id: &str,
    provider: Provider,
) -> Result<Option<String>, KeysError> {
    match queries::get_active_key_ciphertext(pool, user_id, provider).await? {
        Some(stored) => Ok(Some(vault.decrypt_from_storage(&stored)?)),
        None => Ok(None),
    }
}
