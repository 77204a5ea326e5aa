//! Supplier purchase database operations
//!
//! Receiving a purchase adds its quantities to product/variant stock in the
//! same transaction that records it.

use std::collections::HashMap;

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{PaymentStatus, Purchase, PurchaseCreate, PurchaseItem};
use shared::pricing::{calculate_purchase_totals, payment_status_for, to_decimal, to_f64};
use shared::response::PageQuery;
use shared::util::{document_number, now_millis, snowflake_id};
use sqlx::{PgConnection, PgPool};

use super::stock::{self, StockTarget};
use super::{products, suppliers, variants};
use crate::core::ServiceResult;

const COLUMNS: &str = "id, reference, supplier_id, subtotal, shipping_cost, discount, total, \
    paid_amount, payment_status, note, purchased_at, created_by, created_at, updated_at";

const REFERENCE_ATTEMPTS: usize = 5;

#[derive(sqlx::FromRow)]
struct PurchaseRow {
    id: i64,
    reference: String,
    supplier_id: i64,
    subtotal: f64,
    shipping_cost: f64,
    discount: f64,
    total: f64,
    paid_amount: f64,
    payment_status: String,
    note: Option<String>,
    purchased_at: i64,
    created_by: i64,
    created_at: i64,
    updated_at: i64,
}

impl PurchaseRow {
    fn into_purchase(self, items: Vec<PurchaseItem>) -> Purchase {
        Purchase {
            id: self.id,
            reference: self.reference,
            supplier_id: self.supplier_id,
            items,
            subtotal: self.subtotal,
            shipping_cost: self.shipping_cost,
            discount: self.discount,
            total: self.total,
            paid_amount: self.paid_amount,
            due_amount: outstanding(self.total, self.paid_amount),
            payment_status: PaymentStatus::from_db(&self.payment_status),
            note: self.note,
            purchased_at: self.purchased_at,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    purchase_id: i64,
    product_id: i64,
    variant_id: Option<i64>,
    name: String,
    quantity: i32,
    unit_cost: f64,
}

fn outstanding(total: f64, paid: f64) -> f64 {
    to_f64((to_decimal(total) - to_decimal(paid)).max(Decimal::ZERO))
}

fn overpaid(total: f64, paid: f64) -> AppError {
    AppError::with_message(
        ErrorCode::PurchaseOverpaid,
        format!("Paid amount {paid:.2} exceeds purchase total {total:.2}"),
    )
    .with_detail("total", total)
    .with_detail("paid_amount", paid)
}

async fn assemble(conn: &mut PgConnection, rows: Vec<PurchaseRow>) -> ServiceResult<Vec<Purchase>> {
    if rows.is_empty() {
        return Ok(vec![]);
    }
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let item_rows = sqlx::query_as::<_, ItemRow>(
        "SELECT purchase_id, product_id, variant_id, name, quantity, unit_cost \
         FROM purchase_items WHERE purchase_id = ANY($1) ORDER BY id",
    )
    .bind(&ids)
    .fetch_all(conn)
    .await?;

    let mut items: HashMap<i64, Vec<PurchaseItem>> = HashMap::new();
    for r in item_rows {
        items.entry(r.purchase_id).or_default().push(PurchaseItem {
            product_id: r.product_id,
            variant_id: r.variant_id,
            name: r.name,
            quantity: r.quantity,
            unit_cost: r.unit_cost,
        });
    }
    Ok(rows
        .into_iter()
        .map(|row| {
            let id = row.id;
            row.into_purchase(items.remove(&id).unwrap_or_default())
        })
        .collect())
}

pub async fn find_page(pool: &PgPool, page: &PageQuery) -> ServiceResult<(Vec<Purchase>, i64)> {
    let mut conn = pool.acquire().await?;
    let rows = sqlx::query_as::<_, PurchaseRow>(&format!(
        "SELECT {COLUMNS} FROM purchases ORDER BY purchased_at DESC, id DESC LIMIT $1 OFFSET $2"
    ))
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&mut *conn)
    .await?;
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM purchases")
        .fetch_one(&mut *conn)
        .await?;
    Ok((assemble(&mut conn, rows).await?, total))
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> ServiceResult<Option<Purchase>> {
    let mut conn = pool.acquire().await?;
    let Some(row) = sqlx::query_as::<_, PurchaseRow>(&format!(
        "SELECT {COLUMNS} FROM purchases WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    else {
        return Ok(None);
    };
    Ok(assemble(&mut conn, vec![row]).await?.pop())
}

/// Record a purchase and receive its stock
pub async fn create(pool: &PgPool, created_by: i64, data: &PurchaseCreate) -> ServiceResult<Purchase> {
    if data.items.is_empty() {
        return Err(AppError::invalid_field("items", "A purchase needs at least one item").into());
    }
    if suppliers::find_by_id(pool, data.supplier_id).await?.is_none() {
        return Err(AppError::new(ErrorCode::SupplierNotFound)
            .with_detail("supplier_id", data.supplier_id)
            .into());
    }

    let lines: Vec<(i32, f64)> = data.items.iter().map(|i| (i.quantity, i.unit_cost)).collect();
    let paid = data.paid_amount.unwrap_or(0.0);
    let totals = calculate_purchase_totals(
        &lines,
        data.shipping_cost.unwrap_or(0.0),
        data.discount.unwrap_or(0.0),
        paid,
    );
    if to_decimal(paid) > to_decimal(totals.total) {
        return Err(overpaid(totals.total, paid).into());
    }

    let now = now_millis();
    let mut tx = pool.begin().await?;
    let mut items = Vec::with_capacity(data.items.len());
    for input in &data.items {
        let product = products::find_for_update(&mut tx, input.product_id)
            .await?
            .ok_or_else(|| {
                AppError::new(ErrorCode::ProductNotFound).with_detail("product_id", input.product_id)
            })?;
        let name = match input.variant_id {
            Some(vid) => {
                let variant = variants::find_by_id(&mut tx, product.id, vid)
                    .await?
                    .ok_or_else(|| {
                        AppError::new(ErrorCode::VariantNotFound).with_detail("variant_id", vid)
                    })?;
                format!("{} ({})", product.name, variant.label())
            }
            None => product.name.clone(),
        };
        stock::increment(
            &mut tx,
            StockTarget::new(product.id, input.variant_id),
            input.quantity,
        )
        .await?;
        items.push(PurchaseItem {
            product_id: product.id,
            variant_id: input.variant_id,
            name,
            quantity: input.quantity,
            unit_cost: to_f64(to_decimal(input.unit_cost)),
        });
    }

    let id = snowflake_id();
    let mut reference = None;
    for _ in 0..REFERENCE_ATTEMPTS {
        let candidate = document_number("PUR", now);
        let result = sqlx::query(
            "INSERT INTO purchases (id, reference, supplier_id, subtotal, shipping_cost, discount, total, \
                paid_amount, payment_status, note, purchased_at, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13) \
             ON CONFLICT (reference) DO NOTHING",
        )
        .bind(id)
        .bind(&candidate)
        .bind(data.supplier_id)
        .bind(totals.subtotal)
        .bind(to_f64(to_decimal(data.shipping_cost.unwrap_or(0.0))))
        .bind(to_f64(to_decimal(data.discount.unwrap_or(0.0))))
        .bind(totals.total)
        .bind(to_f64(to_decimal(paid)))
        .bind(totals.payment_status.as_str())
        .bind(&data.note)
        .bind(data.purchased_at.unwrap_or(now))
        .bind(created_by)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() > 0 {
            reference = Some(candidate);
            break;
        }
    }
    let reference =
        reference.ok_or_else(|| AppError::internal("Could not allocate a purchase reference"))?;

    for item in &items {
        sqlx::query(
            "INSERT INTO purchase_items (id, purchase_id, product_id, variant_id, name, quantity, unit_cost) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(snowflake_id())
        .bind(id)
        .bind(item.product_id)
        .bind(item.variant_id)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.unit_cost)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    tracing::info!(purchase_id = id, %reference, supplier_id = data.supplier_id, total = totals.total, "Purchase received");
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PurchaseNotFound).into())
}

/// Add a supplier payment; the running paid amount may not exceed the total
pub async fn add_payment(pool: &PgPool, id: i64, amount: f64) -> ServiceResult<Purchase> {
    let mut tx = pool.begin().await?;
    let (total, paid): (f64, f64) =
        sqlx::query_as("SELECT total, paid_amount FROM purchases WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::PurchaseNotFound))?;

    let new_paid = to_decimal(paid) + to_decimal(amount);
    if new_paid > to_decimal(total) {
        return Err(overpaid(total, to_f64(new_paid)).into());
    }

    sqlx::query(
        "UPDATE purchases SET paid_amount = $2, payment_status = $3, updated_at = $4 WHERE id = $1",
    )
    .bind(id)
    .bind(to_f64(new_paid))
    .bind(payment_status_for(new_paid, to_decimal(total)).as_str())
    .bind(now_millis())
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PurchaseNotFound).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outstanding_never_negative() {
        assert_eq!(outstanding(100.0, 40.0), 60.0);
        assert_eq!(outstanding(100.0, 100.0), 0.0);
        assert_eq!(outstanding(100.0, 120.0), 0.0);
    }

    #[test]
    fn test_overpaid_error_details() {
        let err = overpaid(50.0, 60.0);
        assert_eq!(err.code, ErrorCode::PurchaseOverpaid);
        assert_eq!(err.details.unwrap().get("total").unwrap(), 50.0);
    }
}
