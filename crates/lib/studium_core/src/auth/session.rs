//! Session authority — issues, verifies, rotates, and revokes token pairs.
//!
//! Refresh tokens have a dual representation: the signed JWT the client
//! holds, and a bcrypt-hashed record in the store. Verification is a
//! two-step pipeline — signature first (tamper check), then the persisted
//! record (the actual authority). Deleting the record revokes the token
//! even though its signature would still verify.

use std::sync::Arc;

use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::store::RecordStore;
use super::{jwt, AuthError};
use crate::models::auth::{RefreshTokenRecord, TokenIdentity, TokenPair, User};

/// Issues and validates token pairs for user sessions.
///
/// One instance per process, constructed at startup and handed to request
/// handlers by reference.
pub struct SessionAuthority {
    store: Arc<dyn RecordStore>,
    secret: Vec<u8>,
    access_expiry_secs: i64,
    refresh_expiry_days: i64,
    bcrypt_cost: u32,
}

impl SessionAuthority {
    pub fn new(
        store: Arc<dyn RecordStore>,
        secret: &str,
        access_expiry_secs: i64,
        refresh_expiry_days: i64,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            store,
            secret: secret.as_bytes().to_vec(),
            access_expiry_secs,
            refresh_expiry_days,
            bcrypt_cost,
        }
    }

    /// Issue a fresh access/refresh pair for a user.
    ///
    /// Persists a hashed refresh-token record expiring at server clock plus
    /// the refresh lifetime. Fails only on storage trouble.
    pub async fn issue_token_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        let access_token = jwt::generate_access_token(user, &self.secret, self.access_expiry_secs)?;
        let refresh_token =
            jwt::generate_refresh_token(&user.id, &self.secret, self.refresh_expiry_days)?;

        let token_hash = hash_refresh_token(refresh_token.clone(), self.bcrypt_cost).await?;
        let expires_at = Utc::now() + Duration::days(self.refresh_expiry_days);
        self.store
            .insert_refresh_token(&user.id, &token_hash, expires_at)
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.access_expiry_secs,
        })
    }

    /// Verify an access token. Pure — no store access, no side effects.
    pub fn verify_access_token(&self, token: &str) -> Result<TokenIdentity, AuthError> {
        jwt::verify_access_token(token, &self.secret)
    }

    /// Exchange a refresh token for a new token pair (single-use rotation).
    ///
    /// The matched record is deleted before the replacement is issued, so a
    /// given refresh token rotates at most once; concurrent rotations race
    /// on the delete and the loser gets `InvalidToken`.
    pub async fn rotate_tokens(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        // Step 1: tamper check — signature and type tag.
        let claims = jwt::verify_refresh_token(refresh_token, &self.secret)?;

        // Step 2: the persisted record is the authority.
        let records = self.store.refresh_tokens_for_user(&claims.sub).await?;
        let record = match_refresh_token(refresh_token.to_string(), records)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        // Step 3: lazy cleanup of an expired record.
        if record.expires_at <= Utc::now() {
            self.store.delete_refresh_token(&record.id).await?;
            debug!(user_id = %claims.sub, "refresh token expired, record removed");
            return Err(AuthError::InvalidToken);
        }

        // Step 4: retire the presented token before minting its successor.
        if !self.store.delete_refresh_token(&record.id).await? {
            // A concurrent rotation already consumed it.
            return Err(AuthError::InvalidToken);
        }

        let user = self
            .store
            .find_user(&claims.sub)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        self.issue_token_pair(&user).await
    }

    /// Revoke a specific refresh token. Idempotent — revoking a token whose
    /// record is already gone is not an error.
    pub async fn revoke(&self, user_id: &str, refresh_token: &str) -> Result<(), AuthError> {
        let records = self.store.refresh_tokens_for_user(user_id).await?;
        if let Some(record) = match_refresh_token(refresh_token.to_string(), records).await? {
            self.store.delete_refresh_token(&record.id).await?;
        }
        Ok(())
    }

    /// Revoke every refresh token for a user ("log out everywhere").
    pub async fn revoke_all(&self, user_id: &str) -> Result<u64, AuthError> {
        let removed = self.store.delete_refresh_tokens_for_user(user_id).await?;
        info!(user_id, removed, "revoked all refresh tokens");
        Ok(removed)
    }

    /// Bulk-delete expired refresh-token records.
    pub async fn cleanup_expired(&self) -> Result<u64, AuthError> {
        let removed = self.store.delete_expired_refresh_tokens(Utc::now()).await?;
        if removed > 0 {
            debug!(removed, "cleaned up expired refresh tokens");
        }
        Ok(removed)
    }
}

/// Pre-hash for bcrypt: bcrypt truncates input at 72 bytes, and a JWT is
/// longer than that, so the token is SHA-256'd first (64 hex chars) so the
/// whole token feeds into the hash.
fn prehash(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// bcrypt-hash a refresh token for storage, off the async thread.
async fn hash_refresh_token(token: String, cost: u32) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(prehash(&token), cost))
        .await
        .map_err(|e| AuthError::Internal(format!("bcrypt task: {e}")))?
        .map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Find the stored record matching a presented token, off the async thread.
///
/// A stored hash that fails to parse counts as a non-match, same as a
/// revoked token.
async fn match_refresh_token(
    token: String,
    records: Vec<RefreshTokenRecord>,
) -> Result<Option<RefreshTokenRecord>, AuthError> {
    tokio::task::spawn_blocking(move || {
        let digest = prehash(&token);
        records
            .into_iter()
            .find(|r| bcrypt::verify(&digest, &r.token_hash).unwrap_or(false))
    })
    .await
    .map_err(|e| AuthError::Internal(format!("bcrypt task: {e}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};

    use super::*;
    use crate::ids::uuidv7;

    /// In-memory record store standing in for the hosted database.
    #[derive(Default)]
    struct MemoryStore {
        users: Mutex<HashMap<String, User>>,
        tokens: Mutex<Vec<RefreshTokenRecord>>,
    }

    impl MemoryStore {
        fn add_user(&self, user: User) {
            self.users.lock().unwrap().insert(user.id.clone(), user);
        }

        fn remove_user(&self, user_id: &str) {
            self.users.lock().unwrap().remove(user_id);
        }

        fn token_count(&self) -> usize {
            self.tokens.lock().unwrap().len()
        }

        /// Backdate every stored record past its expiry.
        fn expire_all(&self) {
            let mut tokens = self.tokens.lock().unwrap();
            for t in tokens.iter_mut() {
                t.expires_at = Utc::now() - Duration::hours(1);
            }
        }
    }

    #[async_trait]
    impl RecordStore for MemoryStore {
        async fn insert_refresh_token(
            &self,
            user_id: &str,
            token_hash: &str,
            expires_at: DateTime<Utc>,
        ) -> Result<(), AuthError> {
            self.tokens.lock().unwrap().push(RefreshTokenRecord {
                id: uuidv7().to_string(),
                user_id: user_id.to_string(),
                token_hash: token_hash.to_string(),
                expires_at,
            });
            Ok(())
        }

        async fn refresh_tokens_for_user(
            &self,
            user_id: &str,
        ) -> Result<Vec<RefreshTokenRecord>, AuthError> {
            Ok(self
                .tokens
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.user_id == user_id)
                .cloned()
                .collect())
        }

        async fn delete_refresh_token(&self, token_id: &str) -> Result<bool, AuthError> {
            let mut tokens = self.tokens.lock().unwrap();
            let before = tokens.len();
            tokens.retain(|t| t.id != token_id);
            Ok(tokens.len() < before)
        }

        async fn delete_refresh_tokens_for_user(&self, user_id: &str) -> Result<u64, AuthError> {
            let mut tokens = self.tokens.lock().unwrap();
            let before = tokens.len();
            tokens.retain(|t| t.user_id != user_id);
            Ok((before - tokens.len()) as u64)
        }

        async fn delete_expired_refresh_tokens(
            &self,
            now: DateTime<Utc>,
        ) -> Result<u64, AuthError> {
            let mut tokens = self.tokens.lock().unwrap();
            let before = tokens.len();
            tokens.retain(|t| t.expires_at > now);
            Ok((before - tokens.len()) as u64)
        }

        async fn find_user(&self, user_id: &str) -> Result<Option<User>, AuthError> {
            Ok(self.users.lock().unwrap().get(user_id).cloned())
        }
    }

    const SECRET: &str = "session-authority-test-secret";

    fn test_user() -> User {
        User {
            id: uuidv7().to_string(),
            email: "grace@example.com".into(),
            name: Some("Grace".into()),
        }
    }

    fn authority(store: Arc<MemoryStore>) -> SessionAuthority {
        // Minimum bcrypt cost keeps the tests fast.
        SessionAuthority::new(store, SECRET, 900, 7, 4)
    }

    #[tokio::test]
    async fn issue_then_verify_returns_user_identity() {
        let store = Arc::new(MemoryStore::default());
        let auth = authority(store.clone());
        let user = test_user();
        store.add_user(user.clone());

        let pair = auth.issue_token_pair(&user).await.unwrap();
        assert_eq!(pair.expires_in, 900);
        assert_eq!(store.token_count(), 1);

        let identity = auth.verify_access_token(&pair.access_token).unwrap();
        assert_eq!(identity.user_id, user.id);
        assert_eq!(identity.email, user.email);
        assert_eq!(identity.name, user.name);
    }

    #[tokio::test]
    async fn rotation_succeeds_exactly_once() {
        let store = Arc::new(MemoryStore::default());
        let auth = authority(store.clone());
        let user = test_user();
        store.add_user(user.clone());

        let pair = auth.issue_token_pair(&user).await.unwrap();
        let rotated = auth.rotate_tokens(&pair.refresh_token).await.unwrap();
        assert_ne!(rotated.refresh_token, pair.refresh_token);
        assert_eq!(store.token_count(), 1);

        // The old token's record is gone; a second rotation must fail.
        assert!(matches!(
            auth.rotate_tokens(&pair.refresh_token).await,
            Err(AuthError::InvalidToken)
        ));

        // The replacement still works.
        auth.rotate_tokens(&rotated.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn expired_record_is_lazily_deleted() {
        let store = Arc::new(MemoryStore::default());
        let auth = authority(store.clone());
        let user = test_user();
        store.add_user(user.clone());

        let pair = auth.issue_token_pair(&user).await.unwrap();
        store.expire_all();

        assert!(matches!(
            auth.rotate_tokens(&pair.refresh_token).await,
            Err(AuthError::InvalidToken)
        ));
        assert_eq!(store.token_count(), 0, "expired record should be removed");
    }

    #[tokio::test]
    async fn revoke_then_rotate_fails() {
        let store = Arc::new(MemoryStore::default());
        let auth = authority(store.clone());
        let user = test_user();
        store.add_user(user.clone());

        let pair = auth.issue_token_pair(&user).await.unwrap();
        auth.revoke(&user.id, &pair.refresh_token).await.unwrap();
        assert_eq!(store.token_count(), 0);

        assert!(matches!(
            auth.rotate_tokens(&pair.refresh_token).await,
            Err(AuthError::InvalidToken)
        ));

        // Revoking again is a no-op, not an error.
        auth.revoke(&user.id, &pair.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn revoke_all_clears_every_session() {
        let store = Arc::new(MemoryStore::default());
        let auth = authority(store.clone());
        let user = test_user();
        store.add_user(user.clone());

        auth.issue_token_pair(&user).await.unwrap();
        auth.issue_token_pair(&user).await.unwrap();
        auth.issue_token_pair(&user).await.unwrap();

        assert_eq!(auth.revoke_all(&user.id).await.unwrap(), 3);
        assert_eq!(store.token_count(), 0);
    }

    #[tokio::test]
    async fn never_issued_token_is_invalid_not_user_missing() {
        let store = Arc::new(MemoryStore::default());
        let auth = authority(store.clone());
        let user = test_user();
        store.add_user(user.clone());

        // Well-formed and correctly signed, but never persisted.
        let orphan = jwt::generate_refresh_token(&user.id, SECRET.as_bytes(), 7).unwrap();
        assert!(matches!(
            auth.rotate_tokens(&orphan).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn rotation_for_deleted_user_reports_user_not_found() {
        let store = Arc::new(MemoryStore::default());
        let auth = authority(store.clone());
        let user = test_user();
        store.add_user(user.clone());

        let pair = auth.issue_token_pair(&user).await.unwrap();
        store.remove_user(&user.id);

        assert!(matches!(
            auth.rotate_tokens(&pair.refresh_token).await,
            Err(AuthError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn access_token_is_rejected_as_refresh_token() {
        let store = Arc::new(MemoryStore::default());
        let auth = authority(store.clone());
        let user = test_user();
        store.add_user(user.clone());

        let pair = auth.issue_token_pair(&user).await.unwrap();
        assert!(matches!(
            auth.rotate_tokens(&pair.access_token).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn cleanup_removes_only_expired_records() {
        let store = Arc::new(MemoryStore::default());
        let auth = authority(store.clone());
        let user = test_user();
        store.add_user(user.clone());

        auth.issue_token_pair(&user).await.unwrap();
        store.expire_all();
        auth.issue_token_pair(&user).await.unwrap();

        assert_eq!(auth.cleanup_expired().await.unwrap(), 1);
        assert_eq!(store.token_count(), 1);
    }
}
