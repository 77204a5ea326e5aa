//! Order database operations
//!
//! Orders are stored across `orders`, `order_items` and `order_payments`.
//! `Order::recalculate_payment` runs before every write of the order row, so
//! `paid_amount` and `payment_status` always reflect the confirmed payments.

use std::collections::HashMap;

use shared::error::{AppError, ErrorCode};
use shared::models::{
    Order, OrderCreate, OrderItem, OrderQuery, OrderStatus, Payment, PaymentCreate, PaymentMethod,
    PaymentRecordStatus, PaymentStatus, ShippingAddress, SiteSettings, VariantOption,
    normalize_code,
};
use shared::pricing::{CartLine, calculate_cart_totals, order_total, to_decimal, to_f64};
use shared::response::PageQuery;
use shared::util::{document_number, now_millis, snowflake_id};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use super::stock::{self, StockTarget};
use super::{carts, coupons, products, variants};
use crate::core::ServiceResult;

const ORDER_COLUMNS: &str = "id, order_number, user_id, shipping_address, payment_method, subtotal, \
    shipping_fee, discount, total, coupon_code, status, paid_amount, payment_status, note, created_at, updated_at";

/// Attempts at drawing an unused order number
const ORDER_NUMBER_ATTEMPTS: usize = 5;

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    order_number: String,
    user_id: i64,
    shipping_address: Json<ShippingAddress>,
    payment_method: String,
    subtotal: f64,
    shipping_fee: f64,
    discount: f64,
    total: f64,
    coupon_code: Option<String>,
    status: String,
    paid_amount: f64,
    payment_status: String,
    note: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>, payments: Vec<Payment>) -> Order {
        let mut order = Order {
            id: self.id,
            order_number: self.order_number,
            user_id: self.user_id,
            items,
            shipping_address: self.shipping_address.0,
            payment_method: PaymentMethod::from_db(&self.payment_method),
            subtotal: self.subtotal,
            shipping_fee: self.shipping_fee,
            discount: self.discount,
            total: self.total,
            coupon_code: self.coupon_code,
            status: OrderStatus::from_db(&self.status),
            payments,
            paid_amount: self.paid_amount,
            payment_status: PaymentStatus::from_db(&self.payment_status),
            due_amount: 0.0,
            note: self.note,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        order.due_amount = shared::pricing::due_amount(order.total, order.paid_amount);
        order
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: i64,
    order_id: i64,
    product_id: i64,
    variant_id: Option<i64>,
    name: String,
    image: Option<String>,
    sku: Option<String>,
    price: f64,
    quantity: i32,
    variant_options: Json<Vec<VariantOption>>,
}

impl From<ItemRow> for OrderItem {
    fn from(r: ItemRow) -> Self {
        Self {
            id: r.id,
            product_id: r.product_id,
            variant_id: r.variant_id,
            name: r.name,
            image: r.image,
            sku: r.sku,
            price: r.price,
            quantity: r.quantity,
            variant_options: r.variant_options.0,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: i64,
    order_id: i64,
    amount: f64,
    method: String,
    status: String,
    transaction_id: Option<String>,
    note: Option<String>,
    created_at: i64,
}

impl From<PaymentRow> for Payment {
    fn from(r: PaymentRow) -> Self {
        Self {
            id: r.id,
            amount: r.amount,
            method: r.method,
            status: PaymentRecordStatus::from_db(&r.status),
            transaction_id: r.transaction_id,
            note: r.note,
            created_at: r.created_at,
        }
    }
}

/// Load items and payments for a batch of order rows
async fn assemble(conn: &mut PgConnection, rows: Vec<OrderRow>) -> ServiceResult<Vec<Order>> {
    if rows.is_empty() {
        return Ok(vec![]);
    }
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

    let item_rows = sqlx::query_as::<_, ItemRow>(
        "SELECT id, order_id, product_id, variant_id, name, image, sku, price, quantity, variant_options \
         FROM order_items WHERE order_id = ANY($1) ORDER BY id",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;
    let payment_rows = sqlx::query_as::<_, PaymentRow>(
        "SELECT id, order_id, amount, method, status, transaction_id, note, created_at \
         FROM order_payments WHERE order_id = ANY($1) ORDER BY created_at, id",
    )
    .bind(&ids)
    .fetch_all(conn)
    .await?;

    let mut items: HashMap<i64, Vec<OrderItem>> = HashMap::new();
    for row in item_rows {
        items.entry(row.order_id).or_default().push(row.into());
    }
    let mut payments: HashMap<i64, Vec<Payment>> = HashMap::new();
    for row in payment_rows {
        payments.entry(row.order_id).or_default().push(row.into());
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let id = row.id;
            row.into_order(
                items.remove(&id).unwrap_or_default(),
                payments.remove(&id).unwrap_or_default(),
            )
        })
        .collect())
}

async fn find_row(conn: &mut PgConnection, id: i64, lock: bool) -> ServiceResult<Option<OrderRow>> {
    let suffix = if lock { " FOR UPDATE" } else { "" };
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1{suffix}"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

async fn load(conn: &mut PgConnection, id: i64, lock: bool) -> ServiceResult<Order> {
    let row = find_row(&mut *conn, id, lock)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    let mut orders = assemble(conn, vec![row]).await?;
    orders
        .pop()
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).into())
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> ServiceResult<Option<Order>> {
    let mut conn = pool.acquire().await?;
    let Some(row) = find_row(&mut conn, id, false).await? else {
        return Ok(None);
    };
    Ok(assemble(&mut conn, vec![row]).await?.pop())
}

/// Admin listing with optional status filters
pub async fn find_page(
    pool: &PgPool,
    query: &OrderQuery,
    page: &PageQuery,
) -> ServiceResult<(Vec<Order>, i64)> {
    let status = query.status.map(|s| s.as_str());
    let payment_status = query.payment_status.map(|s| s.as_str());
    let mut conn = pool.acquire().await?;

    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders \
         WHERE ($1::text IS NULL OR status = $1) AND ($2::text IS NULL OR payment_status = $2) \
         ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4"
    ))
    .bind(status)
    .bind(payment_status)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&mut *conn)
    .await?;

    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM orders \
         WHERE ($1::text IS NULL OR status = $1) AND ($2::text IS NULL OR payment_status = $2)",
    )
    .bind(status)
    .bind(payment_status)
    .fetch_one(&mut *conn)
    .await?;

    Ok((assemble(&mut conn, rows).await?, total))
}

/// Orders placed by one customer, newest first
pub async fn find_by_user(
    pool: &PgPool,
    user_id: i64,
    page: &PageQuery,
) -> ServiceResult<(Vec<Order>, i64)> {
    let mut conn = pool.acquire().await?;
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 \
         ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
    ))
    .bind(user_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&mut *conn)
    .await?;
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok((assemble(&mut conn, rows).await?, total))
}

/// Write the order row (insert or update). Payment fields are re-derived first.
async fn save(conn: &mut PgConnection, order: &mut Order, insert: bool) -> ServiceResult<bool> {
    order.recalculate_payment();
    order.updated_at = now_millis();

    let sql = if insert {
        "INSERT INTO orders (id, order_number, user_id, shipping_address, payment_method, subtotal, \
            shipping_fee, discount, total, coupon_code, status, paid_amount, payment_status, note, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
         ON CONFLICT (order_number) DO NOTHING"
    } else {
        "UPDATE orders SET order_number = $2, user_id = $3, shipping_address = $4, payment_method = $5, \
            subtotal = $6, shipping_fee = $7, discount = $8, total = $9, coupon_code = $10, status = $11, \
            paid_amount = $12, payment_status = $13, note = $14, created_at = $15, updated_at = $16 \
         WHERE id = $1"
    };
    let result = sqlx::query(sql)
        .bind(order.id)
        .bind(&order.order_number)
        .bind(order.user_id)
        .bind(Json(&order.shipping_address))
        .bind(order.payment_method.as_str())
        .bind(order.subtotal)
        .bind(order.shipping_fee)
        .bind(order.discount)
        .bind(order.total)
        .bind(&order.coupon_code)
        .bind(order.status.as_str())
        .bind(order.paid_amount)
        .bind(order.payment_status.as_str())
        .bind(&order.note)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Place an order in one transaction.
///
/// Each line resolves the live product (and variant), snapshots name, price,
/// image and SKU, then takes stock with a guarded decrement. Any failure rolls
/// the whole order back. On success the customer's cart is emptied.
pub async fn create(
    pool: &PgPool,
    user_id: i64,
    data: &OrderCreate,
    settings: &SiteSettings,
) -> ServiceResult<Order> {
    if data.items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty).into());
    }
    let now = now_millis();

    let coupon = match data.coupon_code.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(code) => Some(coupons::find_by_code(pool, code).await?.ok_or_else(|| {
            AppError::new(ErrorCode::CouponNotFound).with_detail("code", normalize_code(code))
        })?),
        None => None,
    };

    let mut tx = pool.begin().await?;
    let mut items = Vec::with_capacity(data.items.len());
    let mut lines = Vec::with_capacity(data.items.len());

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

        let variant = match input.variant_id {
            Some(vid) => Some(
                variants::find_by_id(&mut tx, product.id, vid)
                    .await?
                    .filter(|v| v.is_active)
                    .ok_or_else(|| {
                        AppError::new(ErrorCode::VariantNotFound).with_detail("variant_id", vid)
                    })?,
            ),
            None if product.has_variations => {
                return Err(AppError::new(ErrorCode::VariantRequired)
                    .with_detail("product_id", product.id)
                    .into());
            }
            None => None,
        };

        let (name, price, sale_price, image, sku, options) = match &variant {
            Some(v) => (
                format!("{} ({})", product.name, v.label()),
                v.price,
                None,
                v.image.clone().or_else(|| product.images.first().cloned()),
                Some(v.sku.clone()),
                v.options.clone(),
            ),
            None => (
                product.name.clone(),
                product.price,
                product.active_sale_price(now),
                product.images.first().cloned(),
                product.sku.clone(),
                Vec::new(),
            ),
        };

        stock::decrement(
            &mut tx,
            StockTarget::new(product.id, input.variant_id),
            input.quantity,
            &name,
        )
        .await?;

        let line = CartLine {
            price,
            sale_price,
            quantity: input.quantity,
        };
        lines.push(line);
        items.push(OrderItem {
            id: snowflake_id(),
            product_id: product.id,
            variant_id: input.variant_id,
            name,
            image,
            sku,
            price: line.unit_price(),
            quantity: input.quantity,
            variant_options: options,
        });
    }

    let subtotal = calculate_cart_totals(&lines, None).subtotal;
    if let Some(coupon) = &coupon {
        coupon.check_applicable(subtotal, now)?;
    }
    let totals = calculate_cart_totals(&lines, coupon.as_ref());
    let shipping_fee = settings.shipping_fee_for(totals.total);

    let mut order = Order {
        id: snowflake_id(),
        order_number: String::new(),
        user_id,
        items,
        shipping_address: data.shipping_address.clone(),
        payment_method: data.payment_method,
        subtotal: totals.subtotal,
        shipping_fee: to_f64(to_decimal(shipping_fee)),
        discount: totals.discount,
        total: order_total(&totals, shipping_fee),
        coupon_code: coupon.as_ref().map(|c| c.code.clone()),
        status: OrderStatus::Pending,
        payments: Vec::new(),
        paid_amount: 0.0,
        payment_status: PaymentStatus::Pending,
        due_amount: 0.0,
        note: data.note.clone(),
        created_at: now,
        updated_at: now,
    };

    let mut inserted = false;
    for _ in 0..ORDER_NUMBER_ATTEMPTS {
        order.order_number = document_number("ORD", now);
        if save(&mut tx, &mut order, true).await? {
            inserted = true;
            break;
        }
    }
    if !inserted {
        return Err(AppError::internal("Could not allocate an order number").into());
    }

    for item in &order.items {
        sqlx::query(
            "INSERT INTO order_items (id, order_id, product_id, variant_id, name, image, sku, price, quantity, variant_options) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(item.id)
        .bind(order.id)
        .bind(item.product_id)
        .bind(item.variant_id)
        .bind(&item.name)
        .bind(&item.image)
        .bind(&item.sku)
        .bind(item.price)
        .bind(item.quantity)
        .bind(Json(&item.variant_options))
        .execute(&mut *tx)
        .await?;
    }

    carts::clear(&mut tx, user_id).await?;
    tx.commit().await?;

    tracing::info!(
        order_id = order.id,
        order_number = %order.order_number,
        user_id,
        total = order.total,
        "Order placed"
    );
    Ok(order)
}

/// Change fulfilment status. Cancelling returns every line's stock in the
/// same transaction.
pub async fn update_status(pool: &PgPool, id: i64, next: OrderStatus) -> ServiceResult<Order> {
    let mut tx = pool.begin().await?;
    let mut order = load(&mut tx, id, true).await?;
    order.status.check_transition(next)?;

    if next == OrderStatus::Cancelled {
        let lines: Vec<_> = order.stock_lines().collect();
        for (product_id, variant_id, quantity) in lines {
            stock::increment(&mut tx, StockTarget::new(product_id, variant_id), quantity).await?;
        }
    }

    let previous = order.status;
    order.status = next;
    save(&mut tx, &mut order, false).await?;
    tx.commit().await?;

    tracing::info!(order_id = id, from = %previous, to = %next, "Order status changed");
    Ok(order)
}

/// Record a payment and re-derive the order's payment fields
pub async fn add_payment(pool: &PgPool, id: i64, data: &PaymentCreate) -> ServiceResult<Order> {
    let mut tx = pool.begin().await?;
    let mut order = load(&mut tx, id, true).await?;
    if order.status == OrderStatus::Cancelled {
        return Err(AppError::new(ErrorCode::OrderAlreadyCancelled).into());
    }

    let payment = Payment {
        id: snowflake_id(),
        amount: to_f64(to_decimal(data.amount)),
        method: data.method.trim().to_string(),
        status: data.status.unwrap_or(PaymentRecordStatus::Pending),
        transaction_id: data.transaction_id.clone(),
        note: data.note.clone(),
        created_at: now_millis(),
    };
    sqlx::query(
        "INSERT INTO order_payments (id, order_id, amount, method, status, transaction_id, note, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(payment.id)
    .bind(order.id)
    .bind(payment.amount)
    .bind(&payment.method)
    .bind(payment.status.as_str())
    .bind(&payment.transaction_id)
    .bind(&payment.note)
    .bind(payment.created_at)
    .execute(&mut *tx)
    .await?;

    order.payments.push(payment);
    save(&mut tx, &mut order, false).await?;
    tx.commit().await?;
    Ok(order)
}

/// Change one payment record's status and re-derive the order's payment fields
pub async fn update_payment_status(
    pool: &PgPool,
    id: i64,
    payment_id: i64,
    status: PaymentRecordStatus,
) -> ServiceResult<Order> {
    let mut tx = pool.begin().await?;
    let mut order = load(&mut tx, id, true).await?;

    let payment = order
        .payments
        .iter_mut()
        .find(|p| p.id == payment_id)
        .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;
    payment.status = status;

    sqlx::query("UPDATE order_payments SET status = $3 WHERE id = $1 AND order_id = $2")
        .bind(payment_id)
        .bind(id)
        .bind(status.as_str())
        .execute(&mut *tx)
        .await?;

    save(&mut tx, &mut order, false).await?;
    tx.commit().await?;
    Ok(order)
}

/// The delivered order (if any) through which `user_id` bought `product_id`
pub async fn find_delivered_purchase(
    pool: &PgPool,
    user_id: i64,
    product_id: i64,
) -> ServiceResult<Option<i64>> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT o.id FROM orders o JOIN order_items i ON i.order_id = o.id \
         WHERE o.user_id = $1 AND i.product_id = $2 AND o.status = 'delivered' \
         ORDER BY o.created_at DESC LIMIT 1",
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(id,)| id))
}
