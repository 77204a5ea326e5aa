//! Money calculation utilities using rust_decimal for precision
//!
//! All arithmetic runs on `Decimal`, then is rounded half-up to 2 decimal
//! places and converted back to `f64` for storage/serialization.
//!
//! - [`derive_payment`]: paid amount and payment status from payment records
//! - [`calculate_cart_totals`]: cart subtotal / coupon discount / total
//! - [`calculate_purchase_totals`]: supplier purchase totals
//! - [`calculate_sale_totals`]: POS sale totals, tax and change
//! - [`average_rating`]: product rating aggregate

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::{Coupon, CouponType, Payment, PaymentRecordStatus, PaymentStatus};

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Convert an f64 amount to Decimal
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Round to cents and convert back to f64
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Compare two amounts with cent tolerance
pub fn money_eq(a: f64, b: f64) -> bool {
    (to_decimal(a) - to_decimal(b)).abs() < MONEY_TOLERANCE
}

// ── Payment status ──────────────────────────────────────────────────

/// Result of re-deriving an order's payment fields
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub paid_amount: f64,
    pub payment_status: PaymentStatus,
}

/// Status rule shared by orders, purchases and sales.
///
/// Zero paid is `pending` even when `total` is zero; otherwise
/// `paid >= total` is `paid` and anything less is `partial`.
/// `failed` and `refunded` are never derived.
pub fn payment_status_for(paid: Decimal, total: Decimal) -> PaymentStatus {
    if paid.is_zero() {
        PaymentStatus::Pending
    } else if paid >= total {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Partial
    }
}

/// Sum confirmed payments and derive the aggregate status
pub fn derive_payment<'a>(
    payments: impl IntoIterator<Item = &'a Payment>,
    total: f64,
) -> PaymentSummary {
    let paid: Decimal = payments
        .into_iter()
        .filter(|p| p.status == PaymentRecordStatus::Confirmed)
        .map(|p| to_decimal(p.amount))
        .sum();
    let paid = paid.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    PaymentSummary {
        paid_amount: to_f64(paid),
        payment_status: payment_status_for(paid, to_decimal(total)),
    }
}

/// `total - paid`, not clamped
pub fn due_amount(total: f64, paid: f64) -> f64 {
    to_f64(to_decimal(total) - to_decimal(paid))
}

// ── Cart ────────────────────────────────────────────────────────────

/// Priced cart line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartLine {
    pub price: f64,
    pub sale_price: Option<f64>,
    pub quantity: i32,
}

impl CartLine {
    pub fn unit_price(&self) -> f64 {
        self.sale_price.unwrap_or(self.price)
    }

    pub fn line_total(&self) -> f64 {
        to_f64(to_decimal(self.unit_price()) * Decimal::from(self.quantity))
    }
}

/// Computed cart totals (never persisted)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CartTotals {
    pub subtotal: f64,
    pub discount: f64,
    pub total: f64,
    pub item_count: i32,
}

/// Discount a coupon grants on `subtotal`, capped at the subtotal
pub fn coupon_discount(coupon: &Coupon, subtotal: Decimal) -> Decimal {
    let value = to_decimal(coupon.value);
    let raw = match coupon.coupon_type {
        CouponType::Percentage => subtotal * value / Decimal::ONE_HUNDRED,
        CouponType::Fixed => value,
    };
    raw.max(Decimal::ZERO).min(subtotal)
}

/// `subtotal = Σ (sale_price ?? price) × quantity`, coupon discount capped
/// at the subtotal, `total = subtotal - discount`
pub fn calculate_cart_totals(lines: &[CartLine], coupon: Option<&Coupon>) -> CartTotals {
    let subtotal: Decimal = lines
        .iter()
        .map(|l| to_decimal(l.unit_price()) * Decimal::from(l.quantity))
        .sum();
    let subtotal = subtotal.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    let discount = coupon
        .map(|c| coupon_discount(c, subtotal))
        .unwrap_or(Decimal::ZERO)
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);

    CartTotals {
        subtotal: to_f64(subtotal),
        discount: to_f64(discount),
        total: to_f64(subtotal - discount),
        item_count: lines.iter().map(|l| l.quantity).sum(),
    }
}

/// Order grand total: cart total plus shipping
pub fn order_total(totals: &CartTotals, shipping_fee: f64) -> f64 {
    to_f64(to_decimal(totals.total) + to_decimal(shipping_fee))
}

// ── Purchase ────────────────────────────────────────────────────────

/// Derived purchase amounts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PurchaseTotals {
    pub subtotal: f64,
    pub total: f64,
    pub due_amount: f64,
    pub payment_status: PaymentStatus,
}

/// `(quantity, unit_cost)` lines plus shipping and discount
pub fn calculate_purchase_totals(
    lines: &[(i32, f64)],
    shipping_cost: f64,
    discount: f64,
    paid_amount: f64,
) -> PurchaseTotals {
    let subtotal: Decimal = lines
        .iter()
        .map(|(qty, cost)| Decimal::from(*qty) * to_decimal(*cost))
        .sum();
    let total = (subtotal + to_decimal(shipping_cost) - to_decimal(discount)).max(Decimal::ZERO);
    let total = total.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    let paid = to_decimal(paid_amount);
    PurchaseTotals {
        subtotal: to_f64(subtotal),
        total: to_f64(total),
        due_amount: to_f64((total - paid).max(Decimal::ZERO)),
        payment_status: payment_status_for(paid, total),
    }
}

// ── Sale ────────────────────────────────────────────────────────────

/// Derived POS sale amounts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaleTotals {
    pub subtotal: f64,
    pub discount: f64,
    pub tax: f64,
    pub total: f64,
    pub change_amount: f64,
    pub due_amount: f64,
    pub payment_status: PaymentStatus,
}

/// `(quantity, unit_price)` lines; tax applies to the discounted subtotal
pub fn calculate_sale_totals(
    lines: &[(i32, f64)],
    discount: f64,
    tax_rate: f64,
    paid_amount: f64,
) -> SaleTotals {
    let round = |d: Decimal| d.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);

    let subtotal = round(
        lines
            .iter()
            .map(|(qty, price)| Decimal::from(*qty) * to_decimal(*price))
            .sum(),
    );
    let discount = round(to_decimal(discount).max(Decimal::ZERO).min(subtotal));
    let taxable = (subtotal - discount).max(Decimal::ZERO);
    let tax = round(taxable * to_decimal(tax_rate) / Decimal::ONE_HUNDRED);
    let total = taxable + tax;
    let paid = to_decimal(paid_amount);

    SaleTotals {
        subtotal: to_f64(subtotal),
        discount: to_f64(discount),
        tax: to_f64(tax),
        total: to_f64(total),
        change_amount: to_f64((paid - total).max(Decimal::ZERO)),
        due_amount: to_f64((total - paid).max(Decimal::ZERO)),
        payment_status: payment_status_for(paid, total),
    }
}

// ── Ratings ─────────────────────────────────────────────────────────

/// Mean rating rounded to one decimal (0 when there are no ratings)
pub fn average_rating(ratings: &[i32]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: Decimal = ratings.iter().map(|r| Decimal::from(*r)).sum();
    (sum / Decimal::from(ratings.len()))
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests;
