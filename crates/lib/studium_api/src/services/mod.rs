//! Business-logic services sitting between handlers and `studium_core`.

pub mod auth;
