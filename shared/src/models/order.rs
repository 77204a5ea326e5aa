//! Order Model

use serde::{Deserialize, Serialize};
use std::fmt;

use super::product::VariantOption;
use crate::error::{AppError, ErrorCode};

/// Order fulfilment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse the TEXT column value; unknown values fall back to `Pending`
    pub fn from_db(s: &str) -> Self {
        match s {
            "confirmed" => Self::Confirmed,
            "processing" => Self::Processing,
            "shipped" => Self::Shipped,
            "delivered" => Self::Delivered,
            "cancelled" => Self::Cancelled,
            _ => Self::Pending,
        }
    }

    /// Terminal states accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Validate a status change requested by staff.
    ///
    /// Non-terminal states may move freely (including backwards); a
    /// same-state update is a no-op. Terminal states are final.
    pub fn check_transition(&self, next: OrderStatus) -> Result<(), AppError> {
        match (self, next) {
            (current, next) if *current == next && !current.is_terminal() => Ok(()),
            (Self::Cancelled, Self::Cancelled) => Err(AppError::new(ErrorCode::OrderAlreadyCancelled)),
            (Self::Delivered, Self::Cancelled) => Err(AppError::new(ErrorCode::OrderNotCancellable)),
            (current, next) if current.is_terminal() => Err(AppError::with_message(
                ErrorCode::InvalidStatusTransition,
                format!("Cannot change order status from {current} to {next}"),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate payment state of an order, purchase or sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Partial,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Partial => "partial",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    pub fn from_db(s: &str) -> Self {
        match s {
            "partial" => Self::Partial,
            "paid" => Self::Paid,
            "failed" => Self::Failed,
            "refunded" => Self::Refunded,
            _ => Self::Pending,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of one payment record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentRecordStatus {
    #[default]
    Pending,
    Confirmed,
    Failed,
    Refunded,
}

impl PaymentRecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    pub fn from_db(s: &str) -> Self {
        match s {
            "confirmed" => Self::Confirmed,
            "failed" => Self::Failed,
            "refunded" => Self::Refunded,
            _ => Self::Pending,
        }
    }
}

/// Payment methods accepted at checkout and at the POS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    CashOnDelivery,
    Card,
    BankTransfer,
    MobileBanking,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::CashOnDelivery => "cash_on_delivery",
            Self::Card => "card",
            Self::BankTransfer => "bank_transfer",
            Self::MobileBanking => "mobile_banking",
        }
    }

    pub fn from_db(s: &str) -> Self {
        match s {
            "cash_on_delivery" => Self::CashOnDelivery,
            "card" => Self::Card,
            "bank_transfer" => Self::BankTransfer,
            "mobile_banking" => Self::MobileBanking,
            _ => Self::Cash,
        }
    }
}

/// Shipping address snapshot (stored as JSON on the order)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub address_line: String,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Order line item, a denormalized snapshot taken at checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub product_id: i64,
    pub variant_id: Option<i64>,
    pub name: String,
    pub image: Option<String>,
    pub sku: Option<String>,
    pub price: f64,
    pub quantity: i32,
    #[serde(default)]
    pub variant_options: Vec<VariantOption>,
}

/// One payment recorded against an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub amount: f64,
    pub method: String,
    pub status: PaymentRecordStatus,
    pub transaction_id: Option<String>,
    pub note: Option<String>,
    pub created_at: i64,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: String,
    pub user_id: i64,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub subtotal: f64,
    pub shipping_fee: f64,
    pub discount: f64,
    pub total: f64,
    pub coupon_code: Option<String>,
    pub status: OrderStatus,
    pub payments: Vec<Payment>,
    /// Derived: sum of confirmed payments
    pub paid_amount: f64,
    /// Derived from `paid_amount` vs `total`
    pub payment_status: PaymentStatus,
    /// Derived: `total - paid_amount`, not clamped
    pub due_amount: f64,
    pub note: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// Re-derive `paid_amount`, `payment_status` and `due_amount` from the
    /// payment records. Called before every write of the order row.
    pub fn recalculate_payment(&mut self) {
        let summary = crate::pricing::derive_payment(&self.payments, self.total);
        self.paid_amount = summary.paid_amount;
        self.payment_status = summary.payment_status;
        self.due_amount = crate::pricing::due_amount(self.total, self.paid_amount);
    }

    /// Item ids and quantities, for restocking
    pub fn stock_lines(&self) -> impl Iterator<Item = (i64, Option<i64>, i32)> + '_ {
        self.items
            .iter()
            .map(|i| (i.product_id, i.variant_id, i.quantity))
    }
}

/// Line requested at checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_id: i64,
    pub variant_id: Option<i64>,
    pub quantity: i32,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub items: Vec<OrderItemInput>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<String>,
    pub note: Option<String>,
}

/// Status update payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

/// Add payment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCreate {
    pub amount: f64,
    pub method: String,
    pub status: Option<PaymentRecordStatus>,
    pub transaction_id: Option<String>,
    pub note: Option<String>,
}

/// Payment status update payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatusUpdate {
    pub status: PaymentRecordStatus,
}

/// Admin order list filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_db_roundtrip() {
        for s in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::from_db(s.as_str()), s);
        }
        assert_eq!(PaymentStatus::from_db("partial"), PaymentStatus::Partial);
        assert_eq!(
            PaymentRecordStatus::from_db("confirmed"),
            PaymentRecordStatus::Confirmed
        );
        assert_eq!(
            PaymentMethod::from_db("cash_on_delivery"),
            PaymentMethod::CashOnDelivery
        );
    }

    #[test]
    fn test_status_serde_matches_db_text() {
        let json = serde_json::to_string(&OrderStatus::Shipped).unwrap();
        assert_eq!(json, "\"shipped\"");
        let json = serde_json::to_string(&PaymentMethod::BankTransfer).unwrap();
        assert_eq!(json, format!("\"{}\"", PaymentMethod::BankTransfer.as_str()));
    }

    #[test]
    fn test_recalculate_payment() {
        let mut order = Order {
            id: 1,
            order_number: "ORD-20240101-0001".into(),
            user_id: 7,
            items: vec![],
            shipping_address: ShippingAddress::default(),
            payment_method: PaymentMethod::Card,
            subtotal: 100.0,
            shipping_fee: 0.0,
            discount: 0.0,
            total: 100.0,
            coupon_code: None,
            status: OrderStatus::Pending,
            payments: vec![],
            paid_amount: 999.0,
            payment_status: PaymentStatus::Paid,
            due_amount: 0.0,
            note: None,
            created_at: 0,
            updated_at: 0,
        };
        order.recalculate_payment();
        assert_eq!(order.paid_amount, 0.0);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.due_amount, 100.0);

        order.payments.push(Payment {
            id: 2,
            amount: 30.0,
            method: "card".into(),
            status: PaymentRecordStatus::Confirmed,
            transaction_id: None,
            note: None,
            created_at: 0,
        });
        order.payments.push(Payment {
            id: 3,
            amount: 20.0,
            method: "card".into(),
            status: PaymentRecordStatus::Pending,
            transaction_id: None,
            note: None,
            created_at: 0,
        });
        order.recalculate_payment();
        assert_eq!(order.paid_amount, 30.0);
        assert_eq!(order.payment_status, PaymentStatus::Partial);
        assert_eq!(order.due_amount, 70.0);
    }

    #[test]
    fn test_status_transitions() {
        use OrderStatus::*;
        assert!(Pending.check_transition(Confirmed).is_ok());
        assert!(Shipped.check_transition(Processing).is_ok());
        assert!(Shipped.check_transition(Cancelled).is_ok());
        assert!(Pending.check_transition(Pending).is_ok());
        assert_eq!(
            Cancelled.check_transition(Cancelled).unwrap_err().code,
            ErrorCode::OrderAlreadyCancelled
        );
        assert_eq!(
            Delivered.check_transition(Cancelled).unwrap_err().code,
            ErrorCode::OrderNotCancellable
        );
        assert_eq!(
            Cancelled.check_transition(Pending).unwrap_err().code,
            ErrorCode::InvalidStatusTransition
        );
        assert_eq!(
            Delivered.check_transition(Delivered).unwrap_err().code,
            ErrorCode::InvalidStatusTransition
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
    }
}
