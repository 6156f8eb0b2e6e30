//! Record store abstraction for session state.
//!
//! The session authority only needs a handful of CRUD operations against
//! the hosted database; this trait is that contract. `PgRecordStore` is the
//! production implementation, tests use an in-memory one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{queries, AuthError};
use crate::models::auth::{RefreshTokenRecord, User};

/// Persistence operations required by [`super::session::SessionAuthority`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a hashed refresh-token record.
    async fn insert_refresh_token(
        &self,
        user_id: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError>;

    /// Fetch all refresh-token records for a user.
    async fn refresh_tokens_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<RefreshTokenRecord>, AuthError>;

    /// Delete a refresh-token record by ID. Returns whether a row was removed.
    async fn delete_refresh_token(&self, token_id: &str) -> Result<bool, AuthError>;

    /// Delete every refresh-token record for a user. Returns the count removed.
    async fn delete_refresh_tokens_for_user(&self, user_id: &str) -> Result<u64, AuthError>;

    /// Bulk-delete records that expired at or before `now`.
    async fn delete_expired_refresh_tokens(&self, now: DateTime<Utc>) -> Result<u64, AuthError>;

    /// Fetch the active user backing a token, if any.
    async fn find_user(&self, user_id: &str) -> Result<Option<User>, AuthError>;
}

/// PostgreSQL-backed record store.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert_refresh_token(
        &self,
        user_id: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        queries::store_refresh_token(&self.pool, user_id, token_hash, expires_at).await
    }

    async fn refresh_tokens_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<RefreshTokenRecord>, AuthError> {
        queries::refresh_tokens_for_user(&self.pool, user_id).await
    }

    async fn delete_refresh_token(&self, token_id: &str) -> Result<bool, AuthError> {
        queries::delete_refresh_token(&self.pool, token_id).await
    }

    async fn delete_refresh_tokens_for_user(&self, user_id: &str) -> Result<u64, AuthError> {
        queries::delete_refresh_tokens_for_user(&self.pool, user_id).await
    }

    async fn delete_expired_refresh_tokens(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        queries::delete_expired_refresh_tokens(&self.pool, now).await
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>, AuthError> {
        queries::get_user_by_id(&self.pool, user_id).await
    }
}
