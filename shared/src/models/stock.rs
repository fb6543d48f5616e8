//! Stock ledger and stock mutation request models

use serde::{Deserialize, Serialize};

/// Direction of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum MutationType {
    Addition,
    Reduction,
}

impl MutationType {
    /// Signed delta applied to the stock counter for `quantity` units
    pub fn signed(self, quantity: i64) -> i64 {
        match self {
            Self::Addition => quantity,
            Self::Reduction => -quantity,
        }
    }
}

/// Immutable ledger row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StockMutation {
    pub id: i64,
    pub pharmacy_product_id: i64,
    pub mutation_type: MutationType,
    /// Always positive; the sign comes from `mutation_type`
    pub stock: i64,
    pub created_at: i64,
}

/// Stock mutation request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum MutationRequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl MutationRequestStatus {
    /// Accepted and rejected requests can never change again
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Transfer record between two pharmacy products
///
/// Manual requests start `Pending`. Transfers made while accepting an order
/// are stored `Accepted` with the order line they served.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StockMutationRequest {
    pub id: i64,
    pub origin_pharmacy_product_id: i64,
    pub destination_pharmacy_product_id: i64,
    pub stock: i64,
    pub status: MutationRequestStatus,
    pub order_detail_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create stock mutation request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMutationRequestCreate {
    pub origin_pharmacy_product_id: i64,
    pub destination_pharmacy_product_id: i64,
    pub stock: i64,
}

/// Approve / reject payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMutationRequestDecision {
    pub status: MutationRequestStatus,
}

/// Manual restock / write-off payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub mutation_type: MutationType,
    pub stock: i64,
}

/// Counter versus ledger comparison for one pharmacy product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerReport {
    pub pharmacy_product_id: i64,
    pub stock: i64,
    pub ledger_sum: i64,
    pub mutation_count: i64,
    pub consistent: bool,
}
