//! Shared types for the pharmacy fulfillment platform
//!
//! Models, error codes and the JSON response envelope used by the
//! fulfillment server and its clients.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
