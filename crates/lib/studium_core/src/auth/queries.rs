//! Auth-related database queries.

use sqlx::PgPool;

use super::AuthError;
use crate::ids::uuidv7;
use crate::models::auth::{RefreshTokenRecord, User, UserWithPassword};

/// Fetch an active user by email, including the password hash.
pub async fn find_user_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<UserWithPassword>, AuthError> {
    let row = sqlx::query_as::<_, (String, Option<String>, Option<String>)>(
        "SELECT id::text, name, password_hash FROM users WHERE email = $1 AND is_active",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(id, name, password_hash)| UserWithPassword {
        user: User {
            id,
            email: email.to_string(),
            name,
        },
        password_hash,
    }))
}

/// Fetch an active user by ID.
pub async fn get_user_by_id(pool: &PgPool, user_id: &str) -> Result<Option<User>, AuthError> {
    let row = sqlx::query_as::<_, (String, Option<String>)>(
        "SELECT email, name FROM users WHERE id = $1::uuid AND is_active",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(email, name)| User {
        id: user_id.to_string(),
        email,
        name,
    }))
}

/// Create a new user, returning the user ID.
pub async fn create_user(
    pool: &PgPool,
    email: &str,
    name: Option<&str>,
    password_hash: &str,
) -> Result<String, AuthError> {
    let user_id = sqlx::query_scalar::<_, String>(
        "INSERT INTO users (email, name, password_hash) VALUES ($1, $2, $3) RETURNING id::text",
    )
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;
    Ok(user_id)
}

/// Check whether an email is already registered.
pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, AuthError> {
    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

/// Store a refresh token hash for a user.
pub async fn store_refresh_token(
    pool: &PgPool,
    user_id: &str,
    token_hash: &str,
    expires_at: chrono::DateTime<chrono::Utc>,
) -> Result<(), AuthError> {
    sqlx::query(
        "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at) \
         VALUES ($1, $2::uuid, $3, $4)",
    )
    .bind(uuidv7())
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Fetch all refresh-token records for a user.
pub async fn refresh_tokens_for_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<RefreshTokenRecord>, AuthError> {
    let rows = sqlx::query_as::<_, (String, String, chrono::DateTime<chrono::Utc>)>(
        "SELECT id::text, token_hash, expires_at \
         FROM refresh_tokens \
         WHERE user_id = $1::uuid \
         ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(id, token_hash, expires_at)| RefreshTokenRecord {
            id,
            user_id: user_id.to_string(),
            token_hash,
            expires_at,
        })
        .collect())
}

/// Delete a refresh-token record by ID. Returns whether a row was removed.
pub async fn delete_refresh_token(pool: &PgPool, token_id: &str) -> Result<bool, AuthError> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE id = $1::uuid")
        .bind(token_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete every refresh-token record for a user ("log out everywhere").
pub async fn delete_refresh_tokens_for_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<u64, AuthError> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1::uuid")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Bulk-delete expired refresh-token records.
pub async fn delete_expired_refresh_tokens(
    pool: &PgPool,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<u64, AuthError> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= $1")
        .bind(now)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
