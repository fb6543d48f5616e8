//! Unified error codes for the fulfillment platform
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Pharmacy errors
//! - 4xxx: Order errors
//! - 6xxx: Stock errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role is required
    RoleRequired = 2002,

    // ==================== 3xxx: Pharmacy ====================
    /// Pharmacy not found
    PharmacyNotFound = 3001,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has no lines
    OrderEmpty = 4007,
    /// Order cannot be confirmed in its current status
    BadConfirmStatus = 4101,
    /// Order cannot be rejected in its current status
    BadRejectStatus = 4102,
    /// Order cannot be shipped in its current status
    BadShipStatus = 4103,
    /// Order cannot be received in its current status
    BadReceiveStatus = 4104,
    /// Order cannot be canceled in its current status
    BadCancelStatus = 4105,

    // ==================== 6xxx: Stock ====================
    /// Pharmacy product not found
    PharmacyProductNotFound = 6001,
    /// Catalog product not found
    ProductNotFound = 6002,
    /// Not enough stock
    InsufficientStock = 6003,
    /// Product already listed at this pharmacy
    PharmacyProductExists = 6004,
    /// Transfer endpoints reference different products
    DifferentProduct = 6101,
    /// Transfer from a pharmacy to itself
    FromOwnPharmacy = 6102,
    /// Stock mutation request not found
    MutationRequestNotFound = 6201,
    /// Stock mutation request is no longer pending
    MutationRequestAlreadyFinished = 6202,
    /// No nearby pharmacy holds enough stock
    NoPharmacyToStockTransfer = 6301,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,
    /// System busy (lock contention, retry later)
    SystemBusy = 9404,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Specific role is required",

            // Pharmacy
            ErrorCode::PharmacyNotFound => "Pharmacy not found",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Order is empty",
            ErrorCode::BadConfirmStatus => "Order cannot be confirmed in its current status",
            ErrorCode::BadRejectStatus => "Order cannot be rejected in its current status",
            ErrorCode::BadShipStatus => "Order cannot be shipped in its current status",
            ErrorCode::BadReceiveStatus => "Order cannot be received in its current status",
            ErrorCode::BadCancelStatus => "Order cannot be canceled in its current status",

            // Stock
            ErrorCode::PharmacyProductNotFound => "Pharmacy product not found",
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::InsufficientStock => "Insufficient stock",
            ErrorCode::PharmacyProductExists => "Product is already listed at this pharmacy",
            ErrorCode::DifferentProduct => "Origin and destination hold different products",
            ErrorCode::FromOwnPharmacy => "Cannot transfer stock from the same pharmacy",
            ErrorCode::MutationRequestNotFound => "Stock mutation request not found",
            ErrorCode::MutationRequestAlreadyFinished => {
                "Stock mutation request has already been processed"
            }
            ErrorCode::NoPharmacyToStockTransfer => {
                "No pharmacies available with the requested stock"
            }

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::SystemBusy => "System busy, please retry later",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),

            // Pharmacy
            3001 => Ok(ErrorCode::PharmacyNotFound),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4007 => Ok(ErrorCode::OrderEmpty),
            4101 => Ok(ErrorCode::BadConfirmStatus),
            4102 => Ok(ErrorCode::BadRejectStatus),
            4103 => Ok(ErrorCode::BadShipStatus),
            4104 => Ok(ErrorCode::BadReceiveStatus),
            4105 => Ok(ErrorCode::BadCancelStatus),

            // Stock
            6001 => Ok(ErrorCode::PharmacyProductNotFound),
            6002 => Ok(ErrorCode::ProductNotFound),
            6003 => Ok(ErrorCode::InsufficientStock),
            6004 => Ok(ErrorCode::PharmacyProductExists),
            6101 => Ok(ErrorCode::DifferentProduct),
            6102 => Ok(ErrorCode::FromOwnPharmacy),
            6201 => Ok(ErrorCode::MutationRequestNotFound),
            6202 => Ok(ErrorCode::MutationRequestAlreadyFinished),
            6301 => Ok(ErrorCode::NoPharmacyToStockTransfer),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9005 => Ok(ErrorCode::ConfigError),
            9404 => Ok(ErrorCode::SystemBusy),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
