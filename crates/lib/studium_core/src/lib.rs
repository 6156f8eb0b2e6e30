//! # studium_core
//!
//! Core domain logic for Studium: session authority (token issuance,
//! verification, rotation, revocation), the credential vault for
//! third-party AI API keys, and their persistence queries.

pub mod auth;
pub mod ids;
pub mod keys;
pub mod migrate;
pub mod models;
pub mod vault;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
