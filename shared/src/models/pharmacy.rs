//! Pharmacy, catalog product and per-pharmacy stock records

use serde::{Deserialize, Serialize};

/// Pharmacy location (coordinates come from the external location service)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Pharmacy {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub is_active: bool,
    pub created_at: i64,
}

/// Catalog product identity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Dosage / packaging text
    pub content: String,
}

/// A product's stock and price at one pharmacy
///
/// `stock` is a cache over the stock mutation ledger and is only written
/// together with a ledger row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PharmacyProduct {
    pub id: i64,
    pub pharmacy_id: i64,
    pub product_id: i64,
    pub stock: i64,
    pub price: f64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Register pharmacy payload (coordinates already resolved)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PharmacyCreate {
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Register catalog product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    #[serde(default)]
    pub content: String,
}

/// Create pharmacy product payload (stock always starts at 0)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PharmacyProductCreate {
    pub pharmacy_id: i64,
    pub product_id: i64,
    pub price: f64,
}
