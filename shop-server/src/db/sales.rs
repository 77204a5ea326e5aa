//! POS sale database operations
//!
//! A sale takes stock with the same guarded decrement as checkout, inside
//! the transaction that records it.

use std::collections::HashMap;

use shared::error::{AppError, ErrorCode};
use shared::models::{PaymentMethod, PaymentStatus, Sale, SaleCreate, SaleItem};
use shared::pricing::{calculate_sale_totals, to_decimal, to_f64};
use shared::response::PageQuery;
use shared::util::{document_number, now_millis, snowflake_id};
use sqlx::{PgConnection, PgPool};

use super::stock::{self, StockTarget};
use super::{products, variants};
use crate::core::ServiceResult;

const COLUMNS: &str = "id, invoice_number, customer_name, customer_phone, subtotal, discount, tax, total, \
    paid_amount, change_amount, due_amount, payment_method, payment_status, cashier_id, note, created_at";

const INVOICE_ATTEMPTS: usize = 5;

#[derive(sqlx::FromRow)]
struct SaleRow {
    id: i64,
    invoice_number: String,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    subtotal: f64,
    discount: f64,
    tax: f64,
    total: f64,
    paid_amount: f64,
    change_amount: f64,
    due_amount: f64,
    payment_method: String,
    payment_status: String,
    cashier_id: i64,
    note: Option<String>,
    created_at: i64,
}

impl SaleRow {
    fn into_sale(self, items: Vec<SaleItem>) -> Sale {
        Sale {
            id: self.id,
            invoice_number: self.invoice_number,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            items,
            subtotal: self.subtotal,
            discount: self.discount,
            tax: self.tax,
            total: self.total,
            paid_amount: self.paid_amount,
            change_amount: self.change_amount,
            due_amount: self.due_amount,
            payment_method: PaymentMethod::from_db(&self.payment_method),
            payment_status: PaymentStatus::from_db(&self.payment_status),
            cashier_id: self.cashier_id,
            note: self.note,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    sale_id: i64,
    product_id: i64,
    variant_id: Option<i64>,
    name: String,
    quantity: i32,
    unit_price: f64,
}

async fn assemble(conn: &mut PgConnection, rows: Vec<SaleRow>) -> ServiceResult<Vec<Sale>> {
    if rows.is_empty() {
        return Ok(vec![]);
    }
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let item_rows = sqlx::query_as::<_, ItemRow>(
        "SELECT sale_id, product_id, variant_id, name, quantity, unit_price \
         FROM sale_items WHERE sale_id = ANY($1) ORDER BY id",
    )
    .bind(&ids)
    .fetch_all(conn)
    .await?;

    let mut items: HashMap<i64, Vec<SaleItem>> = HashMap::new();
    for r in item_rows {
        items.entry(r.sale_id).or_default().push(SaleItem {
            product_id: r.product_id,
            variant_id: r.variant_id,
            name: r.name,
            quantity: r.quantity,
            unit_price: r.unit_price,
        });
    }
    Ok(rows
        .into_iter()
        .map(|row| {
            let id = row.id;
            row.into_sale(items.remove(&id).unwrap_or_default())
        })
        .collect())
}

pub async fn find_page(pool: &PgPool, page: &PageQuery) -> ServiceResult<(Vec<Sale>, i64)> {
    let mut conn = pool.acquire().await?;
    let rows = sqlx::query_as::<_, SaleRow>(&format!(
        "SELECT {COLUMNS} FROM sales ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
    ))
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&mut *conn)
    .await?;
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sales")
        .fetch_one(&mut *conn)
        .await?;
    Ok((assemble(&mut conn, rows).await?, total))
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> ServiceResult<Option<Sale>> {
    let mut conn = pool.acquire().await?;
    let Some(row) = sqlx::query_as::<_, SaleRow>(&format!("SELECT {COLUMNS} FROM sales WHERE id = $1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };
    Ok(assemble(&mut conn, vec![row]).await?.pop())
}

/// Ring up a POS sale. Lines without an explicit `unit_price` sell at the
/// current effective price (variant price for variant lines). `tax_rate`
/// is the fallback when the request leaves it out.
pub async fn create(
    pool: &PgPool,
    cashier_id: i64,
    data: &SaleCreate,
    tax_rate: f64,
) -> ServiceResult<Sale> {
    if data.items.is_empty() {
        return Err(AppError::invalid_field("items", "A sale needs at least one item").into());
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
        if !product.is_active {
            return Err(AppError::new(ErrorCode::ProductInactive)
                .with_detail("product_id", product.id)
                .into());
        }
        let (name, list_price) = match input.variant_id {
            Some(vid) => {
                let variant = variants::find_by_id(&mut tx, product.id, vid)
                    .await?
                    .filter(|v| v.is_active)
                    .ok_or_else(|| {
                        AppError::new(ErrorCode::VariantNotFound).with_detail("variant_id", vid)
                    })?;
                (format!("{} ({})", product.name, variant.label()), variant.price)
            }
            None if product.has_variations => {
                return Err(AppError::new(ErrorCode::VariantRequired)
                    .with_detail("product_id", product.id)
                    .into());
            }
            None => (product.name.clone(), product.effective_price(now)),
        };

        stock::decrement(
            &mut tx,
            StockTarget::new(product.id, input.variant_id),
            input.quantity,
            &name,
        )
        .await?;
        items.push(SaleItem {
            product_id: product.id,
            variant_id: input.variant_id,
            name,
            quantity: input.quantity,
            unit_price: to_f64(to_decimal(input.unit_price.unwrap_or(list_price))),
        });
    }

    let lines: Vec<(i32, f64)> = items.iter().map(|i| (i.quantity, i.unit_price)).collect();
    let totals = calculate_sale_totals(
        &lines,
        data.discount.unwrap_or(0.0),
        data.tax_rate.unwrap_or(tax_rate),
        data.paid_amount,
    );

    let id = snowflake_id();
    let mut invoice = None;
    for _ in 0..INVOICE_ATTEMPTS {
        let candidate = document_number("INV", now);
        let result = sqlx::query(
            "INSERT INTO sales (id, invoice_number, customer_name, customer_phone, subtotal, discount, tax, total, \
                paid_amount, change_amount, due_amount, payment_method, payment_status, cashier_id, note, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             ON CONFLICT (invoice_number) DO NOTHING",
        )
        .bind(id)
        .bind(&candidate)
        .bind(&data.customer_name)
        .bind(&data.customer_phone)
        .bind(totals.subtotal)
        .bind(totals.discount)
        .bind(totals.tax)
        .bind(totals.total)
        .bind(to_f64(to_decimal(data.paid_amount)))
        .bind(totals.change_amount)
        .bind(totals.due_amount)
        .bind(data.payment_method.as_str())
        .bind(totals.payment_status.as_str())
        .bind(cashier_id)
        .bind(&data.note)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() > 0 {
            invoice = Some(candidate);
            break;
        }
    }
    let invoice = invoice.ok_or_else(|| AppError::internal("Could not allocate an invoice number"))?;

    for item in &items {
        sqlx::query(
            "INSERT INTO sale_items (id, sale_id, product_id, variant_id, name, quantity, unit_price) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(snowflake_id())
        .bind(id)
        .bind(item.product_id)
        .bind(item.variant_id)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    tracing::info!(sale_id = id, invoice = %invoice, cashier_id, total = totals.total, "Sale recorded");
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::SaleNotFound).into())
}
