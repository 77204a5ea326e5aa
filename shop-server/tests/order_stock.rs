//! Order placement and cancellation against a migrated database.
//!
//! Stock is the shared resource here: every test checks the row counts
//! after the fact rather than trusting the returned order.

use shared::models::{
    OrderCreate, OrderItemInput, OrderStatus, PaymentCreate, PaymentMethod, PaymentRecordStatus,
    PaymentStatus, ShippingAddress, SiteSettings,
};
use shared::util::{now_millis, snowflake_id};
use shop_server::core::{ServiceError, ServiceResult};
use shop_server::db::stock::{self, StockTarget};
use shop_server::db::{orders, users};
use shop_server::{AppError, ErrorCode};
use sqlx::PgPool;

async fn customer(pool: &PgPool, email: &str) -> i64 {
    users::create(pool, "Buyer", email, "x", "customer", None)
        .await
        .unwrap()
        .id
}

async fn product(pool: &PgPool, slug: &str, price: f64, stock: i32) -> i64 {
    let id = snowflake_id();
    let now = now_millis();
    sqlx::query(
        "INSERT INTO products (id, name, slug, price, stock, created_at, updated_at) \
         VALUES ($1, $2, $2, $3, $4, $5, $5)",
    )
    .bind(id)
    .bind(slug)
    .bind(price)
    .bind(stock)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();
    id
}

async fn variant(pool: &PgPool, product_id: i64, sku: &str, stock: i32) -> i64 {
    let id = snowflake_id();
    let now = now_millis();
    sqlx::query("UPDATE products SET has_variations = TRUE WHERE id = $1")
        .bind(product_id)
        .execute(pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO product_variants (id, product_id, sku, price, stock, created_at, updated_at) \
         VALUES ($1, $2, $3, 15.0, $4, $5, $5)",
    )
    .bind(id)
    .bind(product_id)
    .bind(sku)
    .bind(stock)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();
    id
}

async fn product_stock(pool: &PgPool, id: i64) -> i32 {
    let (stock,): (i32,) = sqlx::query_as("SELECT stock FROM products WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap();
    stock
}

async fn variant_stock(pool: &PgPool, id: i64) -> i32 {
    let (stock,): (i32,) = sqlx::query_as("SELECT stock FROM product_variants WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap();
    stock
}

fn order_of(items: Vec<(i64, Option<i64>, i32)>) -> OrderCreate {
    OrderCreate {
        items: items
            .into_iter()
            .map(|(product_id, variant_id, quantity)| OrderItemInput {
                product_id,
                variant_id,
                quantity,
            })
            .collect(),
        shipping_address: ShippingAddress {
            full_name: "Ada".into(),
            phone: "555-0100".into(),
            address_line: "1 Main St".into(),
            city: "Springfield".into(),
            ..Default::default()
        },
        payment_method: PaymentMethod::CashOnDelivery,
        coupon_code: None,
        note: None,
    }
}

fn code_of<T: std::fmt::Debug>(result: ServiceResult<T>) -> ErrorCode {
    let err: ServiceError = result.unwrap_err();
    AppError::from(err).code
}

#[sqlx::test(migrations = "./migrations")]
async fn test_concurrent_orders_for_last_unit(pool: PgPool) {
    let first = customer(&pool, "first@example.test").await;
    let second = customer(&pool, "second@example.test").await;
    let mug = product(&pool, "last-mug", 12.0, 1).await;
    let settings = SiteSettings::default();

    let spawn_order = |user_id: i64| {
        let pool = pool.clone();
        let settings = settings.clone();
        tokio::spawn(async move {
            orders::create(&pool, user_id, &order_of(vec![(mug, None, 1)]), &settings).await
        })
    };
    let a = spawn_order(first);
    let b = spawn_order(second);
    let results = [a.await.unwrap(), b.await.unwrap()];

    let placed = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(placed, 1);
    for result in results {
        if result.is_err() {
            assert_eq!(code_of(result), ErrorCode::InsufficientStock);
        }
    }
    assert_eq!(product_stock(&pool, mug).await, 0);

    let (orders,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orders, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_failed_line_rolls_back_earlier_lines(pool: PgPool) {
    let user = customer(&pool, "buyer@example.test").await;
    let plenty = product(&pool, "plenty", 5.0, 10).await;
    let scarce = product(&pool, "scarce", 5.0, 1).await;

    let result = orders::create(
        &pool,
        user,
        &order_of(vec![(plenty, None, 3), (scarce, None, 2)]),
        &SiteSettings::default(),
    )
    .await;

    assert_eq!(code_of(result), ErrorCode::InsufficientStock);
    assert_eq!(product_stock(&pool, plenty).await, 10);
    assert_eq!(product_stock(&pool, scarce).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_cancel_restocks_every_line_once(pool: PgPool) {
    let user = customer(&pool, "buyer@example.test").await;
    let plain = product(&pool, "plain", 8.0, 5).await;
    let shirt = product(&pool, "shirt", 20.0, 0).await;
    let large = variant(&pool, shirt, "SHIRT-L", 4).await;

    let order = orders::create(
        &pool,
        user,
        &order_of(vec![(plain, None, 2), (shirt, Some(large), 3)]),
        &SiteSettings::default(),
    )
    .await
    .unwrap();
    assert_eq!(order.items.len(), 2);
    assert_ne!(order.items[0].id, order.items[1].id);
    assert_eq!(product_stock(&pool, plain).await, 3);
    assert_eq!(variant_stock(&pool, large).await, 1);

    let cancelled = orders::update_status(&pool, order.id, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(product_stock(&pool, plain).await, 5);
    assert_eq!(variant_stock(&pool, large).await, 4);

    let again = orders::update_status(&pool, order.id, OrderStatus::Cancelled).await;
    assert_eq!(code_of(again), ErrorCode::OrderAlreadyCancelled);
    assert_eq!(product_stock(&pool, plain).await, 5);
    assert_eq!(variant_stock(&pool, large).await, 4);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delivered_order_cannot_be_cancelled(pool: PgPool) {
    let user = customer(&pool, "buyer@example.test").await;
    let lamp = product(&pool, "lamp", 30.0, 2).await;
    let order = orders::create(
        &pool,
        user,
        &order_of(vec![(lamp, None, 1)]),
        &SiteSettings::default(),
    )
    .await
    .unwrap();

    orders::update_status(&pool, order.id, OrderStatus::Delivered)
        .await
        .unwrap();
    let result = orders::update_status(&pool, order.id, OrderStatus::Cancelled).await;
    assert_eq!(code_of(result), ErrorCode::OrderNotCancellable);
    assert_eq!(product_stock(&pool, lamp).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_payment_fields_follow_record_status(pool: PgPool) {
    let user = customer(&pool, "buyer@example.test").await;
    let lamp = product(&pool, "lamp", 40.0, 2).await;
    let settings = SiteSettings {
        shipping_fee: 0.0,
        ..SiteSettings::default()
    };
    let order = orders::create(&pool, user, &order_of(vec![(lamp, None, 1)]), &settings)
        .await
        .unwrap();
    assert_eq!(order.total, 40.0);

    let order = orders::add_payment(
        &pool,
        order.id,
        &PaymentCreate {
            amount: 15.0,
            method: "cash".into(),
            status: Some(PaymentRecordStatus::Confirmed),
            transaction_id: None,
            note: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Partial);
    assert_eq!(order.paid_amount, 15.0);
    assert_eq!(order.due_amount, 25.0);

    let payment_id = order.payments[0].id;
    let order = orders::update_payment_status(&pool, order.id, payment_id, PaymentRecordStatus::Refunded)
        .await
        .unwrap();
    assert_eq!(order.paid_amount, 0.0);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.due_amount, 40.0);

    let stored = orders::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Pending);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_guarded_decrement_leaves_row_untouched(pool: PgPool) {
    let cup = product(&pool, "cup", 3.0, 2).await;
    let mut conn = pool.acquire().await.unwrap();

    let result = stock::decrement(&mut conn, StockTarget::Product(cup), 3, "Cup").await;
    let err = AppError::from(result.unwrap_err());
    assert_eq!(err.code, ErrorCode::InsufficientStock);
    assert_eq!(err.details.unwrap().get("available").unwrap(), 2);

    stock::decrement(&mut conn, StockTarget::Product(cup), 2, "Cup")
        .await
        .unwrap();
    drop(conn);
    assert_eq!(product_stock(&pool, cup).await, 0);
}
