//! Unified error codes
//!
//! Error codes are shared by the server and the storefront/admin clients.
//! They are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: User account errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Catalog errors
//! - 7xxx: Cart / coupon / wishlist errors
//! - 80xx-84xx: Purchasing and POS errors
//! - 85xx-89xx: Review and testimonial errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Represented as u16 values on the wire so clients can switch on them
/// without string matching.
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
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1007,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin role required
    AdminRequired = 2003,

    // ==================== 3xxx: User ====================
    /// User not found
    UserNotFound = 3001,
    /// Email is already registered
    EmailAlreadyRegistered = 3002,
    /// Password too short
    PasswordTooShort = 3003,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has no items
    OrderEmpty = 4007,
    /// Order has already been cancelled
    OrderAlreadyCancelled = 4008,
    /// Order can no longer be cancelled
    OrderNotCancellable = 4009,
    /// Order status transition not allowed
    InvalidStatusTransition = 4010,

    // ==================== 5xxx: Payment ====================
    /// Invalid payment method
    PaymentInvalidMethod = 5003,
    /// Payment record not found
    PaymentNotFound = 5006,
    /// Payment amount is invalid
    PaymentInvalidAmount = 5007,

    // ==================== 6xxx: Catalog ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Product has invalid price
    ProductInvalidPrice = 6002,
    /// Not enough stock for the requested quantity
    InsufficientStock = 6003,
    /// Product is not available for sale
    ProductInactive = 6004,
    /// Product slug already exists
    ProductSlugExists = 6005,
    /// Category not found
    CategoryNotFound = 6101,
    /// Category has products
    CategoryHasProducts = 6102,
    /// Category slug already exists
    CategorySlugExists = 6103,
    /// Category has child categories
    CategoryHasChildren = 6104,
    /// Category parent would create a cycle
    CategoryCycle = 6105,
    /// Variant not found
    VariantNotFound = 6201,
    /// Product has variations, a variant must be selected
    VariantRequired = 6202,
    /// Variant SKU already exists
    VariantSkuExists = 6203,
    /// Brand not found
    BrandNotFound = 6401,
    /// Brand has products
    BrandHasProducts = 6402,
    /// Brand slug already exists
    BrandSlugExists = 6403,

    // ==================== 65xx: File Upload ====================
    /// File too large
    FileTooLarge = 6501,
    /// Unsupported file format
    UnsupportedFileFormat = 6502,
    /// Invalid/corrupted image file
    InvalidImageFile = 6503,
    /// No file provided in request
    NoFileProvided = 6504,
    /// Empty file provided
    EmptyFile = 6505,
    /// File storage failed
    FileStorageFailed = 6509,

    // ==================== 7xxx: Cart ====================
    /// Cart item not found
    CartItemNotFound = 7001,
    /// Coupon not found
    CouponNotFound = 7101,
    /// Coupon has expired
    CouponExpired = 7102,
    /// Coupon is inactive
    CouponInactive = 7103,
    /// Cart subtotal below coupon minimum
    CouponMinPurchase = 7104,
    /// Coupon code already exists
    CouponCodeExists = 7105,
    /// Product already in wishlist
    WishlistItemExists = 7201,
    /// Product not in wishlist
    WishlistItemNotFound = 7202,

    // ==================== 8xxx: Purchasing / POS ====================
    /// Supplier not found
    SupplierNotFound = 8001,
    /// Supplier has purchases
    SupplierHasPurchases = 8002,
    /// Purchase not found
    PurchaseNotFound = 8101,
    /// Payment exceeds purchase due amount
    PurchaseOverpaid = 8102,
    /// Sale not found
    SaleNotFound = 8201,

    // ==================== 85xx: Reviews ====================
    /// Review not found
    ReviewNotFound = 8501,
    /// User has no delivered order for this product
    ReviewNotEligible = 8502,
    /// User already reviewed this product
    ReviewAlreadyExists = 8503,
    /// Testimonial not found
    TestimonialNotFound = 8601,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
    /// Storage full (disk space insufficient)
    StorageFull = 9401,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
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
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountDisabled => "Account is disabled",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Administrator role is required",

            // User
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::EmailAlreadyRegistered => "Email is already registered",
            ErrorCode::PasswordTooShort => "Password must be at least 8 characters",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Order has no items",
            ErrorCode::OrderAlreadyCancelled => "Order has already been cancelled",
            ErrorCode::OrderNotCancellable => "Order can no longer be cancelled",
            ErrorCode::InvalidStatusTransition => "Order status transition is not allowed",

            // Payment
            ErrorCode::PaymentInvalidMethod => "Invalid payment method",
            ErrorCode::PaymentNotFound => "Payment not found",
            ErrorCode::PaymentInvalidAmount => "Payment amount is invalid",

            // Catalog
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductInvalidPrice => "Product has invalid price",
            ErrorCode::InsufficientStock => "Insufficient stock",
            ErrorCode::ProductInactive => "Product is not available",
            ErrorCode::ProductSlugExists => "Product slug already exists",
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::CategoryHasProducts => "Category has associated products",
            ErrorCode::CategorySlugExists => "Category slug already exists",
            ErrorCode::CategoryHasChildren => "Category has child categories",
            ErrorCode::CategoryCycle => "Category cannot be its own ancestor",
            ErrorCode::VariantNotFound => "Variant not found",
            ErrorCode::VariantRequired => "A variant must be selected for this product",
            ErrorCode::VariantSkuExists => "Variant SKU already exists",
            ErrorCode::BrandNotFound => "Brand not found",
            ErrorCode::BrandHasProducts => "Brand has associated products",
            ErrorCode::BrandSlugExists => "Brand slug already exists",

            // File Upload
            ErrorCode::FileTooLarge => "File too large",
            ErrorCode::UnsupportedFileFormat => "Unsupported file format",
            ErrorCode::InvalidImageFile => "Invalid image file",
            ErrorCode::NoFileProvided => "No file provided",
            ErrorCode::EmptyFile => "Empty file provided",
            ErrorCode::FileStorageFailed => "File storage failed",

            // Cart
            ErrorCode::CartItemNotFound => "Cart item not found",
            ErrorCode::CouponNotFound => "Coupon not found",
            ErrorCode::CouponExpired => "Coupon has expired",
            ErrorCode::CouponInactive => "Coupon is not active",
            ErrorCode::CouponMinPurchase => "Cart subtotal is below the coupon minimum",
            ErrorCode::CouponCodeExists => "Coupon code already exists",
            ErrorCode::WishlistItemExists => "Product is already in the wishlist",
            ErrorCode::WishlistItemNotFound => "Product is not in the wishlist",

            // Purchasing / POS
            ErrorCode::SupplierNotFound => "Supplier not found",
            ErrorCode::SupplierHasPurchases => "Supplier has associated purchases",
            ErrorCode::PurchaseNotFound => "Purchase not found",
            ErrorCode::PurchaseOverpaid => "Payment exceeds the purchase due amount",
            ErrorCode::SaleNotFound => "Sale not found",

            // Reviews
            ErrorCode::ReviewNotFound => "Review not found",
            ErrorCode::ReviewNotEligible => "Only customers with a delivered order can review this product",
            ErrorCode::ReviewAlreadyExists => "Product has already been reviewed",
            ErrorCode::TestimonialNotFound => "Testimonial not found",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::StorageFull => "Storage full (disk space insufficient)",
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
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1007 => Ok(ErrorCode::AccountDisabled),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2003 => Ok(ErrorCode::AdminRequired),

            // User
            3001 => Ok(ErrorCode::UserNotFound),
            3002 => Ok(ErrorCode::EmailAlreadyRegistered),
            3003 => Ok(ErrorCode::PasswordTooShort),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4007 => Ok(ErrorCode::OrderEmpty),
            4008 => Ok(ErrorCode::OrderAlreadyCancelled),
            4009 => Ok(ErrorCode::OrderNotCancellable),
            4010 => Ok(ErrorCode::InvalidStatusTransition),

            // Payment
            5003 => Ok(ErrorCode::PaymentInvalidMethod),
            5006 => Ok(ErrorCode::PaymentNotFound),
            5007 => Ok(ErrorCode::PaymentInvalidAmount),

            // Catalog
            6001 => Ok(ErrorCode::ProductNotFound),
            6002 => Ok(ErrorCode::ProductInvalidPrice),
            6003 => Ok(ErrorCode::InsufficientStock),
            6004 => Ok(ErrorCode::ProductInactive),
            6005 => Ok(ErrorCode::ProductSlugExists),
            6101 => Ok(ErrorCode::CategoryNotFound),
            6102 => Ok(ErrorCode::CategoryHasProducts),
            6103 => Ok(ErrorCode::CategorySlugExists),
            6104 => Ok(ErrorCode::CategoryHasChildren),
            6105 => Ok(ErrorCode::CategoryCycle),
            6201 => Ok(ErrorCode::VariantNotFound),
            6202 => Ok(ErrorCode::VariantRequired),
            6203 => Ok(ErrorCode::VariantSkuExists),
            6401 => Ok(ErrorCode::BrandNotFound),
            6402 => Ok(ErrorCode::BrandHasProducts),
            6403 => Ok(ErrorCode::BrandSlugExists),

            // File Upload
            6501 => Ok(ErrorCode::FileTooLarge),
            6502 => Ok(ErrorCode::UnsupportedFileFormat),
            6503 => Ok(ErrorCode::InvalidImageFile),
            6504 => Ok(ErrorCode::NoFileProvided),
            6505 => Ok(ErrorCode::EmptyFile),
            6509 => Ok(ErrorCode::FileStorageFailed),

            // Cart
            7001 => Ok(ErrorCode::CartItemNotFound),
            7101 => Ok(ErrorCode::CouponNotFound),
            7102 => Ok(ErrorCode::CouponExpired),
            7103 => Ok(ErrorCode::CouponInactive),
            7104 => Ok(ErrorCode::CouponMinPurchase),
            7105 => Ok(ErrorCode::CouponCodeExists),
            7201 => Ok(ErrorCode::WishlistItemExists),
            7202 => Ok(ErrorCode::WishlistItemNotFound),

            // Purchasing / POS
            8001 => Ok(ErrorCode::SupplierNotFound),
            8002 => Ok(ErrorCode::SupplierHasPurchases),
            8101 => Ok(ErrorCode::PurchaseNotFound),
            8102 => Ok(ErrorCode::PurchaseOverpaid),
            8201 => Ok(ErrorCode::SaleNotFound),

            // Reviews
            8501 => Ok(ErrorCode::ReviewNotFound),
            8502 => Ok(ErrorCode::ReviewNotEligible),
            8503 => Ok(ErrorCode::ReviewAlreadyExists),
            8601 => Ok(ErrorCode::TestimonialNotFound),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),
            9401 => Ok(ErrorCode::StorageFull),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::InsufficientStock.code(), 6003);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_try_from_roundtrips_known_codes() {
        for code in [
            ErrorCode::ValidationFailed,
            ErrorCode::TokenExpired,
            ErrorCode::EmailAlreadyRegistered,
            ErrorCode::OrderAlreadyCancelled,
            ErrorCode::PaymentNotFound,
            ErrorCode::CategoryHasChildren,
            ErrorCode::CouponMinPurchase,
            ErrorCode::PurchaseOverpaid,
            ErrorCode::ReviewNotEligible,
            ErrorCode::StorageFull,
        ] {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_try_from_unknown() {
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::ProductNotFound).unwrap();
        assert_eq!(json, "6001");
        let code: ErrorCode = serde_json::from_str("7101").unwrap();
        assert_eq!(code, ErrorCode::CouponNotFound);
        assert!(serde_json::from_str::<ErrorCode>("1234").is_err());
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::NotFound.is_success());
    }
}
