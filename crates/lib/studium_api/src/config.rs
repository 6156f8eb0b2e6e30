//! API server configuration.

use thiserror::Error;

use studium_core::auth::jwt::{
    DEFAULT_ACCESS_TOKEN_EXPIRY_SECS, DEFAULT_REFRESH_TOKEN_EXPIRY_DAYS,
};
use studium_core::auth::password::DEFAULT_BCRYPT_COST;

/// Startup configuration errors. The process must not serve traffic when
/// one of these occurs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3400").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Encryption passphrase for stored API keys (vault checks length).
    pub encryption_key: String,
    /// Access token lifetime in seconds. Keep strictly shorter than the
    /// refresh lifetime; rotation assumes access tokens die first.
    pub access_token_expiry_secs: i64,
    /// Refresh token lifetime in days.
    pub refresh_token_expiry_days: i64,
    /// bcrypt cost factor for password and refresh-token hashing.
    pub bcrypt_cost: u32,
}

impl ApiConfig {
    /// Read configuration from environment variables.
    ///
    /// `JWT_SECRET` and `ENCRYPTION_KEY` are required; everything else has
    /// a default. A missing required variable is fatal at startup, never a
    /// per-request error.
    ///
    /// | Variable                    | Default            |
    /// |-----------------------------|--------------------|
    /// | `BIND_ADDR`                 | `127.0.0.1:3400`   |
    /// | `DATABASE_URL`              | `postgres://localhost:5432/studium` |
    /// | `JWT_SECRET`                | required           |
    /// | `ENCRYPTION_KEY`            | required, ≥32 chars |
    /// | `ACCESS_TOKEN_EXPIRY_SECS`  | `900`              |
    /// | `REFRESH_TOKEN_EXPIRY_DAYS` | `7`                |
    /// | `BCRYPT_COST`               | `12`               |
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3400".into()),
            pg_connection_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/studium".into()),
            jwt_secret: require("JWT_SECRET")?,
            encryption_key: require("ENCRYPTION_KEY")?,
            access_token_expiry_secs: parse_or(
                "ACCESS_TOKEN_EXPIRY_SECS",
                DEFAULT_ACCESS_TOKEN_EXPIRY_SECS,
            )?,
            refresh_token_expiry_days: parse_or(
                "REFRESH_TOKEN_EXPIRY_DAYS",
                DEFAULT_REFRESH_TOKEN_EXPIRY_DAYS,
            )?,
            bcrypt_cost: parse_or("BCRYPT_COST", DEFAULT_BCRYPT_COST)?,
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(v) => v
            .parse()
            .map_err(|e: T::Err| ConfigError::Invalid(name, e.to_string())),
        Err(_) => Ok(default),
    }
}
