//! Stock mutation
//!
//! Every decrement is a single guarded `UPDATE ... WHERE stock >= $q`, so a
//! concurrent order can never drive stock below zero. Callers run these inside
//! a transaction and let it roll back on `InsufficientStock`.

use shared::error::AppError;
use sqlx::PgConnection;

use crate::core::ServiceResult;

/// Which row holds the stock for a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockTarget {
    Product(i64),
    Variant(i64),
}

impl StockTarget {
    pub fn new(product_id: i64, variant_id: Option<i64>) -> Self {
        match variant_id {
            Some(id) => StockTarget::Variant(id),
            None => StockTarget::Product(product_id),
        }
    }
}

async fn current_stock(conn: &mut PgConnection, target: StockTarget) -> ServiceResult<i32> {
    let row: Option<(i32,)> = match target {
        StockTarget::Product(id) => sqlx::query_as("SELECT stock FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?,
        StockTarget::Variant(id) => {
            sqlx::query_as("SELECT stock FROM product_variants WHERE id = $1")
                .bind(id)
                .fetch_optional(conn)
                .await?
        }
    };
    Ok(row.map(|(s,)| s).unwrap_or(0))
}

/// Atomically take `quantity` units. Fails with `InsufficientStock` when
/// fewer are available, leaving the row untouched.
pub async fn decrement(
    conn: &mut PgConnection,
    target: StockTarget,
    quantity: i32,
    display_name: &str,
) -> ServiceResult<()> {
    let (sql, id) = match target {
        StockTarget::Product(id) => (
            "UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2",
            id,
        ),
        StockTarget::Variant(id) => (
            "UPDATE product_variants SET stock = stock - $2 WHERE id = $1 AND stock >= $2",
            id,
        ),
    };
    let result = sqlx::query(sql)
        .bind(id)
        .bind(quantity)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        let available = current_stock(conn, target).await?;
        tracing::info!(
            target_id = id,
            available,
            requested = quantity,
            "Stock decrement rejected"
        );
        return Err(AppError::insufficient_stock(display_name, available, quantity).into());
    }
    Ok(())
}

/// Return `quantity` units (order cancellation, purchase receipt)
pub async fn increment(
    conn: &mut PgConnection,
    target: StockTarget,
    quantity: i32,
) -> ServiceResult<()> {
    let (sql, id) = match target {
        StockTarget::Product(id) => ("UPDATE products SET stock = stock + $2 WHERE id = $1", id),
        StockTarget::Variant(id) => (
            "UPDATE product_variants SET stock = stock + $2 WHERE id = $1",
            id,
        ),
    };
    let result = sqlx::query(sql)
        .bind(id)
        .bind(quantity)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        // 商品已删除：快照仍保留，库存无处归还
        tracing::warn!(target_id = id, quantity, "Restock skipped, row no longer exists");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_target_prefers_variant() {
        assert_eq!(StockTarget::new(1, None), StockTarget::Product(1));
        assert_eq!(StockTarget::new(1, Some(9)), StockTarget::Variant(9));
    }
}
