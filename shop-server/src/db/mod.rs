//! Database access layer (PostgreSQL via sqlx)
//!
//! Free async functions taking `&PgPool` (or a transaction) and returning
//! [`ServiceResult`](crate::core::ServiceResult). Business-rule failures come
//! back as `ServiceError::App`, driver failures as `ServiceError::Db`.

pub mod analytics;
pub mod brands;
pub mod carts;
pub mod categories;
pub mod coupons;
pub mod orders;
pub mod products;
pub mod purchases;
pub mod reviews;
pub mod sales;
pub mod site_settings;
pub mod stock;
pub mod suppliers;
pub mod testimonials;
pub mod users;
pub mod variants;
pub mod wishlist;

/// Escape `%`, `_` and `\` for use inside an ILIKE pattern
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.trim().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("shirt"), "%shirt%");
        assert_eq!(like_pattern(" 50% off_"), "%50\\% off\\_%");
    }
}
