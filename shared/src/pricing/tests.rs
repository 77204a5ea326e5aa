use super::*;
use crate::models::{Coupon, CouponType, Payment, PaymentRecordStatus, PaymentStatus};

fn payment(amount: f64, status: PaymentRecordStatus) -> Payment {
    Payment {
        id: 1,
        amount,
        method: "cash".to_string(),
        status,
        transaction_id: None,
        note: None,
        created_at: 0,
    }
}

fn coupon(coupon_type: CouponType, value: f64) -> Coupon {
    Coupon {
        id: 1,
        code: "TEST".to_string(),
        coupon_type,
        value,
        min_purchase: None,
        expires_at: None,
        is_active: true,
        created_at: 0,
        updated_at: 0,
    }
}

fn line(price: f64, sale_price: Option<f64>, quantity: i32) -> CartLine {
    CartLine {
        price,
        sale_price,
        quantity,
    }
}

// ========================================================================
// derive_payment
// ========================================================================

#[test]
fn test_only_confirmed_payments_count() {
    let payments = vec![
        payment(30.0, PaymentRecordStatus::Confirmed),
        payment(20.0, PaymentRecordStatus::Pending),
    ];
    let summary = derive_payment(&payments, 100.0);
    assert_eq!(summary.paid_amount, 30.0);
    assert_eq!(summary.payment_status, PaymentStatus::Partial);
}

#[test]
fn test_no_confirmed_payments_is_pending() {
    let payments = vec![
        payment(50.0, PaymentRecordStatus::Failed),
        payment(50.0, PaymentRecordStatus::Refunded),
    ];
    let summary = derive_payment(&payments, 100.0);
    assert_eq!(summary.paid_amount, 0.0);
    assert_eq!(summary.payment_status, PaymentStatus::Pending);
}

#[test]
fn test_zero_check_runs_before_paid_check() {
    let summary = derive_payment(&[], 0.0);
    assert_eq!(summary.payment_status, PaymentStatus::Pending);
}

#[test]
fn test_paid_when_reaching_or_exceeding_total() {
    let exact = vec![
        payment(60.0, PaymentRecordStatus::Confirmed),
        payment(40.0, PaymentRecordStatus::Confirmed),
    ];
    assert_eq!(derive_payment(&exact, 100.0).payment_status, PaymentStatus::Paid);

    let over = vec![payment(120.0, PaymentRecordStatus::Confirmed)];
    let summary = derive_payment(&over, 100.0);
    assert_eq!(summary.paid_amount, 120.0);
    assert_eq!(summary.payment_status, PaymentStatus::Paid);
}

#[test]
fn test_payment_sum_has_no_float_drift() {
    let payments = vec![
        payment(0.1, PaymentRecordStatus::Confirmed),
        payment(0.2, PaymentRecordStatus::Confirmed),
    ];
    let summary = derive_payment(&payments, 0.3);
    assert_eq!(summary.paid_amount, 0.3);
    assert_eq!(summary.payment_status, PaymentStatus::Paid);
}

#[test]
fn test_due_amount_not_clamped() {
    assert_eq!(due_amount(100.0, 30.0), 70.0);
    assert_eq!(due_amount(100.0, 120.0), -20.0);
}

// ========================================================================
// calculate_cart_totals
// ========================================================================

#[test]
fn test_fixed_coupon_capped_at_subtotal() {
    let totals = calculate_cart_totals(
        &[line(50.0, None, 2)],
        Some(&coupon(CouponType::Fixed, 200.0)),
    );
    assert_eq!(totals.subtotal, 100.0);
    assert_eq!(totals.discount, 100.0);
    assert_eq!(totals.total, 0.0);
    assert_eq!(totals.item_count, 2);
}

#[test]
fn test_sale_price_preferred_over_price() {
    let totals = calculate_cart_totals(&[line(50.0, Some(40.0), 3), line(9.99, None, 1)], None);
    assert_eq!(totals.subtotal, 129.99);
    assert_eq!(totals.discount, 0.0);
    assert_eq!(totals.total, 129.99);
    assert_eq!(totals.item_count, 4);
}

#[test]
fn test_percentage_coupon() {
    let totals = calculate_cart_totals(
        &[line(19.99, None, 3)],
        Some(&coupon(CouponType::Percentage, 15.0)),
    );
    // 59.97 * 15% = 8.9955 -> 9.00
    assert_eq!(totals.subtotal, 59.97);
    assert_eq!(totals.discount, 9.0);
    assert_eq!(totals.total, 50.97);
}

#[test]
fn test_discount_never_exceeds_subtotal() {
    let lines = [line(12.5, Some(10.0), 1), line(3.0, None, 4)];
    for c in [
        coupon(CouponType::Fixed, 0.0),
        coupon(CouponType::Fixed, 21.99),
        coupon(CouponType::Fixed, 22.0),
        coupon(CouponType::Fixed, 1_000_000.0),
        coupon(CouponType::Percentage, 50.0),
        coupon(CouponType::Percentage, 100.0),
        coupon(CouponType::Percentage, 250.0),
    ] {
        let totals = calculate_cart_totals(&lines, Some(&c));
        assert!(totals.discount <= totals.subtotal, "coupon {:?}", c.coupon_type);
        assert!(totals.total >= 0.0);
    }
}

#[test]
fn test_empty_cart() {
    let totals = calculate_cart_totals(&[], Some(&coupon(CouponType::Fixed, 10.0)));
    assert_eq!(totals, CartTotals::default());
}

#[test]
fn test_order_total_adds_shipping() {
    let totals = calculate_cart_totals(&[line(25.0, None, 2)], None);
    assert_eq!(order_total(&totals, 4.99), 54.99);
}

// ========================================================================
// calculate_purchase_totals
// ========================================================================

#[test]
fn test_purchase_totals() {
    let t = calculate_purchase_totals(&[(10, 2.5), (4, 10.0)], 5.0, 3.0, 20.0);
    assert_eq!(t.subtotal, 65.0);
    assert_eq!(t.total, 67.0);
    assert_eq!(t.due_amount, 47.0);
    assert_eq!(t.payment_status, PaymentStatus::Partial);
}

#[test]
fn test_purchase_total_never_negative() {
    let t = calculate_purchase_totals(&[(1, 10.0)], 0.0, 50.0, 0.0);
    assert_eq!(t.total, 0.0);
    assert_eq!(t.due_amount, 0.0);
    assert_eq!(t.payment_status, PaymentStatus::Pending);
}

// ========================================================================
// calculate_sale_totals
// ========================================================================

#[test]
fn test_sale_with_change() {
    // subtotal 100, discount 10, tax 10% of 90 = 9, total 99
    let t = calculate_sale_totals(&[(2, 50.0)], 10.0, 10.0, 100.0);
    assert_eq!(t.subtotal, 100.0);
    assert_eq!(t.tax, 9.0);
    assert_eq!(t.total, 99.0);
    assert_eq!(t.change_amount, 1.0);
    assert_eq!(t.due_amount, 0.0);
    assert_eq!(t.payment_status, PaymentStatus::Paid);
}

#[test]
fn test_sale_underpaid() {
    let t = calculate_sale_totals(&[(3, 10.0)], 0.0, 0.0, 20.0);
    assert_eq!(t.total, 30.0);
    assert_eq!(t.change_amount, 0.0);
    assert_eq!(t.due_amount, 10.0);
    assert_eq!(t.payment_status, PaymentStatus::Partial);
}

#[test]
fn test_sale_discount_capped() {
    let t = calculate_sale_totals(&[(1, 10.0)], 25.0, 20.0, 0.0);
    assert_eq!(t.discount, 10.0);
    assert_eq!(t.tax, 0.0);
    assert_eq!(t.total, 0.0);
    assert_eq!(t.payment_status, PaymentStatus::Pending);
}

// ========================================================================
// average_rating / helpers
// ========================================================================

#[test]
fn test_average_rating() {
    assert_eq!(average_rating(&[]), 0.0);
    assert_eq!(average_rating(&[5, 4, 4]), 4.3);
    assert_eq!(average_rating(&[5, 4]), 4.5);
    assert_eq!(average_rating(&[1, 2, 2, 2]), 1.8);
}

#[test]
fn test_money_eq() {
    assert!(money_eq(0.1 + 0.2, 0.3));
    assert!(!money_eq(10.0, 10.02));
}
