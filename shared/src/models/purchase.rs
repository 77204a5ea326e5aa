//! Purchase Model (supplier stock-in)

use serde::{Deserialize, Serialize};

use super::order::PaymentStatus;

/// Purchased line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseItem {
    pub product_id: i64,
    pub variant_id: Option<i64>,
    pub name: String,
    pub quantity: i32,
    pub unit_cost: f64,
}

/// Purchase entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub id: i64,
    pub reference: String,
    pub supplier_id: i64,
    pub items: Vec<PurchaseItem>,
    pub subtotal: f64,
    pub shipping_cost: f64,
    pub discount: f64,
    pub total: f64,
    pub paid_amount: f64,
    pub due_amount: f64,
    pub payment_status: PaymentStatus,
    pub note: Option<String>,
    pub purchased_at: i64,
    pub created_by: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Line requested when recording a purchase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseItemInput {
    pub product_id: i64,
    pub variant_id: Option<i64>,
    pub quantity: i32,
    pub unit_cost: f64,
}

/// Create purchase payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseCreate {
    pub supplier_id: i64,
    pub items: Vec<PurchaseItemInput>,
    pub shipping_cost: Option<f64>,
    pub discount: Option<f64>,
    pub paid_amount: Option<f64>,
    pub note: Option<String>,
    pub purchased_at: Option<i64>,
}

/// Record an additional payment to the supplier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchasePayment {
    pub amount: f64,
}
