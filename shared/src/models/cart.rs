//! Cart Model

use serde::{Deserialize, Serialize};

use super::product::VariantOption;
use crate::pricing::CartTotals;

/// Variant snapshot stored inline on a cart line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariationSnapshot {
    pub sku: String,
    pub price: f64,
    pub options: Vec<VariantOption>,
    pub image: Option<String>,
}

/// Cart line as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub product_id: i64,
    pub variant_id: Option<i64>,
    pub quantity: i32,
    pub variation: Option<VariationSnapshot>,
    pub added_at: i64,
}

/// Cart line with live product data, as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineView {
    #[serde(flatten)]
    pub item: CartItem,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    /// Regular unit price (variant price for variant lines)
    pub price: f64,
    /// Active sale price, if any
    pub sale_price: Option<f64>,
    pub stock: i32,
    pub line_total: f64,
}

/// Per-user cart with computed totals (never persisted)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub user_id: i64,
    pub items: Vec<CartLineView>,
    pub coupon_code: Option<String>,
    #[serde(flatten)]
    pub totals: CartTotals,
}

/// Add-to-cart payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemAdd {
    pub product_id: i64,
    pub variant_id: Option<i64>,
    pub quantity: i32,
}

/// Change quantity payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemUpdate {
    pub quantity: i32,
}

/// Guest cart merge payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartSync {
    pub items: Vec<CartItemAdd>,
}

/// Apply coupon payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyCoupon {
    pub code: String,
}
