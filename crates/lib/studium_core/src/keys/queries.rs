//! API-key database queries.

use sqlx::PgPool;

use super::KeysError;
use crate::ids::uuidv7;
use crate::models::keys::{ApiKeyRecord, Provider};

/// Count a user's active API keys.
pub async fn count_active_keys(pool: &PgPool, user_id: &str) -> Result<i64, KeysError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM api_keys WHERE user_id = $1::uuid AND is_active",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Delete a user's keys for a provider (replace-on-re-add semantics).
pub async fn delete_keys_for_provider(
    pool: &PgPool,
    user_id: &str,
    provider: Provider,
) -> Result<u64, KeysError> {
    let result = sqlx::query("DELETE FROM api_keys WHERE user_id = $1::uuid AND provider = $2")
        .bind(user_id)
        .bind(provider.as_str())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Insert an encrypted API key, returning the display-safe record.
pub async fn insert_api_key(
    pool: &PgPool,
    user_id: &str,
    provider: Provider,
    encrypted_key: &str,
    key_prefix: &str,
) -> Result<ApiKeyRecord, KeysError> {
    let row = sqlx::query_as::<_, (String, chrono::DateTime<chrono::Utc>)>(
        "INSERT INTO api_keys (id, user_id, provider, encrypted_key, key_prefix) \
         VALUES ($1, $2::uuid, $3, $4, $5) \
         RETURNING id::text, created_at",
    )
    .bind(uuidv7())
    .bind(user_id)
    .bind(provider.as_str())
    .bind(encrypted_key)
    .bind(key_prefix)
    .fetch_one(pool)
    .await?;

    Ok(ApiKeyRecord {
        id: row.0,
        user_id: user_id.to_string(),
        provider,
        key_prefix: key_prefix.to_string(),
        is_active: true,
        created_at: row.1,
    })
}

/// List a user's API keys, newest first. Never selects ciphertext.
pub async fn list_api_keys(pool: &PgPool, user_id: &str) -> Result<Vec<ApiKeyRecord>, KeysError> {
    let rows = sqlx::query_as::<
        _,
        (String, String, String, bool, chrono::DateTime<chrono::Utc>),
    >(
        "SELECT id::text, provider, key_prefix, is_active, created_at \
         FROM api_keys \
         WHERE user_id = $1::uuid \
         ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|(id, provider, key_prefix, is_active, created_at)| {
            let provider = Provider::parse(&provider).ok_or_else(|| {
                KeysError::Internal(format!("unknown provider '{provider}' in storage"))
            })?;
            Ok(ApiKeyRecord {
                id,
                user_id: user_id.to_string(),
                provider,
                key_prefix,
                is_active,
                created_at,
            })
        })
        .collect()
}

/// Delete an API key owned by the user. Returns whether a row was removed.
pub async fn delete_api_key(
    pool: &PgPool,
    user_id: &str,
    key_id: &str,
) -> Result<bool, KeysError> {
    let result = sqlx::query("DELETE FROM api_keys WHERE id = $1::uuid AND user_id = $2::uuid")
        .bind(key_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Fetch the stored ciphertext of the user's active key for a provider.
pub async fn get_active_key_ciphertext(
    pool: &PgPool,
    user_id: &str,
    provider: Provider,
) -> Result<Option<String>, KeysError> {
    let row = sqlx::query_scalar::<_, String>(
        "SELECT encrypted_key FROM api_keys \
         WHERE user_id = $1::uuid AND provider = $2 AND is_active",
    )
    .bind(user_id)
    .bind(provider.as_str())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
