//! fulfillment-server: pharmacy order fulfillment
//!
//! - Accepts orders, deducting stock and pulling shortfalls from the nearest
//!   pharmacy that can cover them
//! - Cancels processed orders, restoring every unit to where it came from
//! - Manual stock transfer requests between pharmacies
//! - Append-only stock ledger with counter verification

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logger;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use state::AppState;
