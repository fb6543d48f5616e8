//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::PharmacyNotFound
            | Self::OrderNotFound
            | Self::PharmacyProductNotFound
            | Self::ProductNotFound
            | Self::MutationRequestNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::PharmacyProductExists
            | Self::MutationRequestAlreadyFinished => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated | Self::TokenExpired | Self::TokenInvalid => {
                StatusCode::UNAUTHORIZED
            }

            // 403 Forbidden
            Self::PermissionDenied | Self::RoleRequired => StatusCode::FORBIDDEN,

            // 503 Service Unavailable (client can retry)
            Self::SystemBusy => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::Unknown | Self::InternalError | Self::DatabaseError | Self::ConfigError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (validation and order/stock preconditions)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_status() {
        assert_eq!(ErrorCode::OrderNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::PharmacyProductNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ErrorCode::MutationRequestNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_conflict_status() {
        assert_eq!(
            ErrorCode::MutationRequestAlreadyFinished.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::PharmacyProductExists.http_status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_precondition_errors_are_bad_request() {
        for code in [
            ErrorCode::BadConfirmStatus,
            ErrorCode::BadRejectStatus,
            ErrorCode::BadShipStatus,
            ErrorCode::BadReceiveStatus,
            ErrorCode::BadCancelStatus,
            ErrorCode::InsufficientStock,
            ErrorCode::DifferentProduct,
            ErrorCode::FromOwnPharmacy,
            ErrorCode::NoPharmacyToStockTransfer,
            ErrorCode::ValidationFailed,
        ] {
            assert_eq!(code.http_status(), StatusCode::BAD_REQUEST, "{code:?}");
        }
    }

    #[test]
    fn test_auth_statuses() {
        assert_eq!(
            ErrorCode::NotAuthenticated.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ErrorCode::PermissionDenied.http_status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_system_statuses() {
        assert_eq!(
            ErrorCode::InternalError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorCode::SystemBusy.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
