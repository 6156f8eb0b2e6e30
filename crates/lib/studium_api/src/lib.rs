//! # studium_api
//!
//! HTTP API library for Studium.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::handlers::{auth, health, keys};
use studium_core::auth::session::SessionAuthority;
use studium_core::auth::store::PgRecordStore;
use studium_core::vault::{CredentialVault, VaultError};

/// Shared application state passed to all handlers.
///
/// The session authority and credential vault are process-wide singletons
/// built once here and handed around by reference.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// API configuration.
    pub config: ApiConfig,
    /// Token issuance/rotation/revocation.
    pub authority: Arc<SessionAuthority>,
    /// API-key encryption.
    pub vault: Arc<CredentialVault>,
}

impl AppState {
    /// Build the application state, constructing the vault and session
    /// authority from configuration. A too-short encryption key fails here,
    /// before the server accepts traffic.
    pub fn new(pool: PgPool, config: ApiConfig) -> Result<Self, VaultError> {
        let vault = Arc::new(CredentialVault::new(&config.encryption_key)?);
        let store = Arc::new(PgRecordStore::new(pool.clone()));
        let authority = Arc::new(SessionAuthority::new(
            store,
            &config.jwt_secret,
            config.access_token_expiry_secs,
            config.refresh_token_expiry_days,
            config.bcrypt_cost,
        ));
        Ok(Self {
            pool,
            config,
            authority,
            vault,
        })
    }
}

/// Run embedded database migrations.
///
/// Delegates to `studium_core::migrate::migrate()` which owns the migration
/// files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    studium_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route("/api/health", get(health::health_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/refresh", post(auth::refresh_handler))
        .route("/api/auth/logout", post(auth::logout_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route("/api/auth/me", get(auth::me_handler))
        .route("/api/auth/logout-all", post(auth::logout_all_handler))
        .route(
            "/api/user/keys",
            get(keys::list_keys_handler).post(keys::add_key_handler),
        )
        .route("/api/user/keys/{id}", delete(keys::delete_key_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
