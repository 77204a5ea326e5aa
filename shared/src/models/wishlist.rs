//! Wishlist Model

use serde::{Deserialize, Serialize};

use super::product::Product;

/// One (user, product) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct WishlistEntry {
    pub user_id: i64,
    pub product_id: i64,
    pub created_at: i64,
}

/// Wishlist entry with its product populated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishlistItem {
    pub product: Product,
    pub added_at: i64,
}

/// Add-to-wishlist payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishlistAdd {
    pub product_id: i64,
}
