//! Sale Model (point-of-sale stock-out)

use serde::{Deserialize, Serialize};

use super::order::{PaymentMethod, PaymentStatus};

/// Sold line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    pub product_id: i64,
    pub variant_id: Option<i64>,
    pub name: String,
    pub quantity: i32,
    pub unit_price: f64,
}

/// Sale entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: i64,
    pub invoice_number: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub items: Vec<SaleItem>,
    pub subtotal: f64,
    pub discount: f64,
    pub tax: f64,
    pub total: f64,
    pub paid_amount: f64,
    pub change_amount: f64,
    pub due_amount: f64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub cashier_id: i64,
    pub note: Option<String>,
    pub created_at: i64,
}

/// Line rung up at the POS; `unit_price` defaults to the product's current price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItemInput {
    pub product_id: i64,
    pub variant_id: Option<i64>,
    pub quantity: i32,
    pub unit_price: Option<f64>,
}

/// Create sale payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleCreate {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub items: Vec<SaleItemInput>,
    pub discount: Option<f64>,
    /// Percent; defaults to the site-wide tax rate
    pub tax_rate: Option<f64>,
    pub paid_amount: f64,
    pub payment_method: PaymentMethod,
    pub note: Option<String>,
}
