//! Input validation helpers
//!
//! Centralized length limits and range checks used by the CRUD handlers.
//! Violations map to 400 `ValidationFailed` with the offending field in
//! the error details.

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: product, category, brand, supplier, user, etc.
pub const MAX_NAME_LEN: usize = 200;

/// Descriptions, notes, review comments, testimonial content
pub const MAX_NOTE_LEN: usize = 2000;

/// Short identifiers: phone, SKU, coupon code, payment method
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

/// URLs / image paths
pub const MAX_URL_LEN: usize = 2048;

/// Addresses
pub const MAX_ADDRESS_LEN: usize = 500;

// ── Numeric limits ──────────────────────────────────────────────────

/// Maximum allowed price / amount (1,000,000)
pub const MAX_PRICE: f64 = 1_000_000.0;

/// Maximum quantity per line
pub const MAX_QUANTITY: i32 = 9999;

/// Maximum images per product
pub const MAX_PRODUCT_IMAGES: usize = 20;

// ── Text ────────────────────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::invalid_field(field, format!("{field} must not be empty")));
    }
    if value.chars().count() > max_len {
        return Err(AppError::invalid_field(
            field,
            format!("{field} is too long ({} chars, max {max_len})", value.chars().count()),
        ));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.chars().count() > max_len
    {
        return Err(AppError::invalid_field(
            field,
            format!("{field} is too long ({} chars, max {max_len})", v.chars().count()),
        ));
    }
    Ok(())
}

/// Minimal email shape check: one `@` with text on both sides
pub fn validate_email(email: &str) -> Result<(), AppError> {
    validate_required_text(email, "email", MAX_EMAIL_LEN)?;
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(' ')
        });
    if !valid {
        return Err(AppError::invalid_field("email", "Invalid email address"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(AppError::new(shared::ErrorCode::PasswordTooShort).with_detail("field", "password"));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(AppError::invalid_field(
            "password",
            format!("password is too long (max {MAX_PASSWORD_LEN})"),
        ));
    }
    Ok(())
}

// ── Numbers ─────────────────────────────────────────────────────────

/// Amount must be finite, non-negative and at most [`MAX_PRICE`]
pub fn validate_amount(value: f64, field: &str) -> Result<(), AppError> {
    if !value.is_finite() {
        return Err(AppError::invalid_field(
            field,
            format!("{field} must be a finite number"),
        ));
    }
    if value < 0.0 {
        return Err(AppError::invalid_field(
            field,
            format!("{field} must be non-negative, got {value}"),
        ));
    }
    if value > MAX_PRICE {
        return Err(AppError::invalid_field(
            field,
            format!("{field} exceeds maximum allowed ({MAX_PRICE}), got {value}"),
        ));
    }
    Ok(())
}

pub fn validate_optional_amount(value: Option<f64>, field: &str) -> Result<(), AppError> {
    match value {
        Some(v) => validate_amount(v, field),
        None => Ok(()),
    }
}

/// Payment amounts must be strictly positive
pub fn validate_positive_amount(value: f64, field: &str) -> Result<(), AppError> {
    validate_amount(value, field)?;
    if value == 0.0 {
        return Err(AppError::with_message(
            shared::ErrorCode::PaymentInvalidAmount,
            format!("{field} must be greater than zero"),
        )
        .with_detail("field", field));
    }
    Ok(())
}

/// Quantity must be in `1..=MAX_QUANTITY`
pub fn validate_quantity(quantity: i32) -> Result<(), AppError> {
    if !(1..=MAX_QUANTITY).contains(&quantity) {
        return Err(AppError::invalid_field(
            "quantity",
            format!("quantity must be between 1 and {MAX_QUANTITY}, got {quantity}"),
        ));
    }
    Ok(())
}

/// Stock levels must be in `0..=i32::MAX`
pub fn validate_stock(stock: i32, field: &str) -> Result<(), AppError> {
    if stock < 0 {
        return Err(AppError::invalid_field(
            field,
            format!("{field} must be non-negative, got {stock}"),
        ));
    }
    Ok(())
}

/// Ratings are whole stars, 1 to 5
pub fn validate_rating(rating: i32) -> Result<(), AppError> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::invalid_field(
            "rating",
            format!("rating must be between 1 and 5, got {rating}"),
        ));
    }
    Ok(())
}

/// Percent values such as coupon percentage or tax rate: `0 < v <= 100`
pub fn validate_percentage(value: f64, field: &str) -> Result<(), AppError> {
    if !value.is_finite() || value <= 0.0 || value > 100.0 {
        return Err(AppError::invalid_field(
            field,
            format!("{field} must be greater than 0 and at most 100, got {value}"),
        ));
    }
    Ok(())
}

/// Tax rates may be zero
pub fn validate_tax_rate(value: f64) -> Result<(), AppError> {
    if value == 0.0 {
        return Ok(());
    }
    validate_percentage(value, "tax_rate")
}

/// Flash-sale windows must not end before they start
pub fn validate_window(start: Option<i64>, end: Option<i64>) -> Result<(), AppError> {
    if let (Some(start), Some(end)) = (start, end)
        && end < start
    {
        return Err(AppError::invalid_field(
            "flash_sale_end",
            "flash_sale_end must not be before flash_sale_start",
        ));
    }
    Ok(())
}

/// Slugs are lowercase ASCII letters, digits, non-ASCII letters and single dashes
pub fn validate_slug(slug: &str) -> Result<(), AppError> {
    validate_required_text(slug, "slug", MAX_NAME_LEN)?;
    let valid = !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c == '-' || c.is_ascii_digit() || c.is_ascii_lowercase() || (!c.is_ascii() && c.is_alphanumeric()));
    if !valid {
        return Err(AppError::invalid_field("slug", format!("Invalid slug: {slug}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ErrorCode;

    fn field_of(err: &AppError) -> Option<String> {
        err.details
            .as_ref()
            .and_then(|d| d.get("field"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Shirt", "name", MAX_NAME_LEN).is_ok());
        let err = validate_required_text("   ", "name", MAX_NAME_LEN).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(field_of(&err).as_deref(), Some("name"));
        assert!(validate_required_text(&"x".repeat(201), "name", MAX_NAME_LEN).is_err());
        // Length is counted in characters, not bytes
        assert!(validate_required_text(&"é".repeat(200), "name", MAX_NAME_LEN).is_ok());
    }

    #[test]
    fn test_optional_text() {
        assert!(validate_optional_text(&None, "note", MAX_NOTE_LEN).is_ok());
        assert!(validate_optional_text(&Some("x".repeat(2001)), "note", MAX_NOTE_LEN).is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("jane@example.com").is_ok());
        assert!(validate_email("jane.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("jane@").is_err());
        assert!(validate_email("ja ne@example.com").is_err());
        assert!(validate_email("a@b@c").is_err());
    }

    #[test]
    fn test_password_length() {
        assert_eq!(
            validate_password("short").unwrap_err().code,
            ErrorCode::PasswordTooShort
        );
        assert!(validate_password("longenough").is_ok());
    }

    #[test]
    fn test_amounts() {
        assert!(validate_amount(0.0, "price").is_ok());
        assert!(validate_amount(MAX_PRICE, "price").is_ok());
        assert!(validate_amount(-0.01, "price").is_err());
        assert!(validate_amount(f64::NAN, "price").is_err());
        assert!(validate_amount(f64::INFINITY, "price").is_err());
        assert!(validate_amount(MAX_PRICE + 1.0, "price").is_err());
        assert_eq!(
            validate_positive_amount(0.0, "amount").unwrap_err().code,
            ErrorCode::PaymentInvalidAmount
        );
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(MAX_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_rating_and_percentage() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());

        assert!(validate_percentage(100.0, "value").is_ok());
        assert!(validate_percentage(0.0, "value").is_err());
        assert!(validate_percentage(100.5, "value").is_err());
        assert!(validate_tax_rate(0.0).is_ok());
    }

    #[test]
    fn test_window() {
        assert!(validate_window(Some(10), Some(20)).is_ok());
        assert!(validate_window(Some(10), None).is_ok());
        assert!(validate_window(Some(20), Some(10)).is_err());
    }

    #[test]
    fn test_slug() {
        assert!(validate_slug("summer-t-shirt").is_ok());
        assert!(validate_slug("café-latte").is_ok());
        assert!(validate_slug("Summer").is_err());
        assert!(validate_slug("-lead").is_err());
        assert!(validate_slug("double--dash").is_err());
        assert!(validate_slug("has space").is_err());
    }
}
