//! Analytics aggregates over orders, sales, users and products

use shared::models::{DailySales, DashboardStats, TopCustomer};
use shared::pricing::{to_decimal, to_f64};
use sqlx::PgPool;

use super::{products, users};
use crate::core::ServiceResult;

pub async fn dashboard(pool: &PgPool) -> ServiceResult<DashboardStats> {
    let (order_revenue, order_count, pending_orders): (f64, i64, i64) = sqlx::query_as(
        "SELECT COALESCE(SUM(paid_amount) FILTER (WHERE status <> 'cancelled'), 0)::float8, \
                COUNT(*), \
                COUNT(*) FILTER (WHERE status = 'pending') \
         FROM orders",
    )
    .fetch_one(pool)
    .await?;
    let (sales_revenue,): (f64,) =
        sqlx::query_as("SELECT COALESCE(SUM(total), 0)::float8 FROM sales")
            .fetch_one(pool)
            .await?;

    Ok(DashboardStats {
        revenue: to_f64(to_decimal(order_revenue) + to_decimal(sales_revenue)),
        order_revenue: to_f64(to_decimal(order_revenue)),
        sales_revenue: to_f64(to_decimal(sales_revenue)),
        order_count,
        pending_orders,
        customer_count: users::count_by_role(pool, "customer").await?,
        product_count: products::count_active(pool).await?,
        low_stock_count: products::count_low_stock(pool).await?,
    })
}

/// Non-cancelled orders grouped by UTC day within `[from, to]` (millis, inclusive)
pub async fn sales_report(
    pool: &PgPool,
    from: Option<i64>,
    to: Option<i64>,
) -> ServiceResult<Vec<DailySales>> {
    let rows = sqlx::query_as::<_, DailySales>(
        "SELECT to_char(to_timestamp(created_at / 1000.0) AT TIME ZONE 'UTC', 'YYYY-MM-DD') AS date, \
                COUNT(*) AS order_count, \
                COALESCE(SUM(total), 0)::float8 AS revenue \
         FROM orders \
         WHERE status <> 'cancelled' \
           AND ($1::bigint IS NULL OR created_at >= $1) \
           AND ($2::bigint IS NULL OR created_at <= $2) \
         GROUP BY 1 ORDER BY 1",
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Customers ranked by spend on non-cancelled orders
pub async fn top_customers(pool: &PgPool, limit: i64) -> ServiceResult<Vec<TopCustomer>> {
    let rows = sqlx::query_as::<_, TopCustomer>(
        "SELECT u.id AS user_id, u.name, u.email, \
                COUNT(o.id) AS order_count, \
                COALESCE(SUM(o.total), 0)::float8 AS total_spent \
         FROM orders o JOIN users u ON u.id = o.user_id \
         WHERE o.status <> 'cancelled' \
         GROUP BY u.id, u.name, u.email \
         ORDER BY total_spent DESC, order_count DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
