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
            | Self::UserNotFound
            | Self::OrderNotFound
            | Self::PaymentNotFound
            | Self::ProductNotFound
            | Self::VariantNotFound
            | Self::CategoryNotFound
            | Self::BrandNotFound
            | Self::CartItemNotFound
            | Self::CouponNotFound
            | Self::WishlistItemNotFound
            | Self::SupplierNotFound
            | Self::PurchaseNotFound
            | Self::SaleNotFound
            | Self::ReviewNotFound
            | Self::TestimonialNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::EmailAlreadyRegistered
            | Self::OrderAlreadyCancelled
            | Self::ProductSlugExists
            | Self::CategorySlugExists
            | Self::CategoryHasProducts
            | Self::CategoryHasChildren
            | Self::BrandSlugExists
            | Self::BrandHasProducts
            | Self::VariantSkuExists
            | Self::CouponCodeExists
            | Self::WishlistItemExists
            | Self::SupplierHasPurchases
            | Self::ReviewAlreadyExists => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::AccountDisabled => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied | Self::AdminRequired | Self::ReviewNotEligible => {
                StatusCode::FORBIDDEN
            }

            // 413 Payload Too Large
            Self::FileTooLarge => StatusCode::PAYLOAD_TOO_LARGE,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::TimeoutError => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::Unknown
            | Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError
            | Self::FileStorageFailed
            | Self::StorageFull => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation/business errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_status() {
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::OrderNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::VariantNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::SupplierNotFound.http_status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_conflict_status() {
        assert_eq!(ErrorCode::CategoryHasProducts.http_status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::BrandHasProducts.http_status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::EmailAlreadyRegistered.http_status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_auth_statuses() {
        assert_eq!(ErrorCode::NotAuthenticated.http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::TokenExpired.http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::PermissionDenied.http_status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_bad_request_default() {
        assert_eq!(ErrorCode::ValidationFailed.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::InsufficientStock.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::CouponExpired.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::OrderEmpty.http_status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_status() {
        assert_eq!(
            ErrorCode::InternalError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorCode::DatabaseError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ErrorCode::FileTooLarge.http_status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
