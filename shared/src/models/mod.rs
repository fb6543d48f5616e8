//! Data models
//!
//! Shared between the fulfillment server and its API clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY), timestamps are Unix millis.

pub mod order;
pub mod pharmacy;
pub mod stock;

// Re-exports
pub use order::*;
pub use pharmacy::*;
pub use stock::*;
