//! Order, order line and status history models

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// Order status as recorded in the status log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum OrderStatus {
    /// Paid, waiting for the pharmacy to confirm
    Waiting,
    /// Confirmed by the pharmacy, stock deducted
    Processed,
    /// Handed to the courier
    Sent,
    /// Receipt confirmed by the user
    Confirmed,
    /// Rejected or canceled by the pharmacy
    CanceledByPharmacy,
}

impl OrderStatus {
    /// Statuses reachable in one step
    pub fn allowed_next(self) -> &'static [OrderStatus] {
        match self {
            Self::Waiting => &[Self::Processed, Self::CanceledByPharmacy],
            Self::Processed => &[Self::Sent, Self::CanceledByPharmacy],
            Self::Sent => &[Self::Confirmed],
            Self::Confirmed | Self::CanceledByPharmacy => &[],
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.allowed_next().contains(&next)
    }
}

/// Actions that move an order through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    /// Pharmacy accepts the order (triggers stock fulfillment)
    Confirm,
    /// Pharmacy rejects a waiting order
    Reject,
    /// Pharmacy ships a processed order
    Ship,
    /// User confirms receipt
    Receive,
    /// Pharmacy cancels a processed order (reverses stock fulfillment)
    Cancel,
}

impl OrderAction {
    pub const ALL: [OrderAction; 5] = [
        Self::Confirm,
        Self::Reject,
        Self::Ship,
        Self::Receive,
        Self::Cancel,
    ];

    /// Status the order's latest log row must have
    pub fn required_status(self) -> OrderStatus {
        match self {
            Self::Confirm | Self::Reject => OrderStatus::Waiting,
            Self::Ship | Self::Cancel => OrderStatus::Processed,
            Self::Receive => OrderStatus::Sent,
        }
    }

    /// Status written by the action
    pub fn target_status(self) -> OrderStatus {
        match self {
            Self::Confirm => OrderStatus::Processed,
            Self::Reject | Self::Cancel => OrderStatus::CanceledByPharmacy,
            Self::Ship => OrderStatus::Sent,
            Self::Receive => OrderStatus::Confirmed,
        }
    }

    /// Error returned when the order is not in [`Self::required_status`]
    pub fn bad_status_code(self) -> ErrorCode {
        match self {
            Self::Confirm => ErrorCode::BadConfirmStatus,
            Self::Reject => ErrorCode::BadRejectStatus,
            Self::Ship => ErrorCode::BadShipStatus,
            Self::Receive => ErrorCode::BadReceiveStatus,
            Self::Cancel => ErrorCode::BadCancelStatus,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Confirm => "confirm",
            Self::Reject => "reject",
            Self::Ship => "ship",
            Self::Receive => "receive",
            Self::Cancel => "cancel",
        }
    }
}

/// Order produced at checkout for one pharmacy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub transaction_id: i64,
    pub pharmacy_id: i64,
    pub user_id: i64,
    pub shipping_address: String,
    pub shipping_cost: f64,
    pub total_payment: f64,
    pub created_at: i64,
}

/// Immutable snapshot of a purchased product
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderDetail {
    pub id: i64,
    pub order_id: i64,
    /// Catalog product id, only used for stock operations
    pub product_id: i64,
    pub name: String,
    pub content: String,
    pub price: f64,
    pub quantity: i64,
}

/// Order line captured at checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetailCreate {
    pub product_id: i64,
    pub name: String,
    #[serde(default)]
    pub content: String,
    pub price: f64,
    pub quantity: i64,
}

/// Checkout hand-off: one order for one pharmacy, starting `Waiting`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub transaction_id: i64,
    pub pharmacy_id: i64,
    pub user_id: i64,
    pub shipping_address: String,
    pub shipping_cost: f64,
    pub total_payment: f64,
    pub details: Vec<OrderDetailCreate>,
}

/// One entry in an order's status history
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderStatusLog {
    pub id: i64,
    pub order_id: i64,
    pub status: OrderStatus,
    pub is_latest: bool,
    pub description: Option<String>,
    pub created_at: i64,
}

/// Order with its lines and current status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithDetails {
    #[serde(flatten)]
    pub order: Order,
    pub status: OrderStatus,
    pub details: Vec<OrderDetail>,
}

/// Optional note attached to a status transition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderTransitionRequest {
    pub description: Option<String>,
}

/// Result of a status transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderTransitionResult {
    pub order_id: i64,
    pub status: OrderStatus,
    pub description: Option<String>,
    /// Number of inter-pharmacy transfers made or reversed
    #[serde(default)]
    pub transfers: usize,
}
