//! Domain models.
//!
//! These are internal domain models, distinct from the API request/response
//! types in `studium_api` (which carry `serde` renames for the wire).

pub mod auth;
pub mod keys;
