//! Wishlist database operations

use std::collections::HashMap;

use shared::error::{AppError, ErrorCode};
use shared::models::{WishlistEntry, WishlistItem};
use shared::util::now_millis;
use sqlx::PgPool;

use super::products;
use crate::core::ServiceResult;
use crate::core::error::unique_or;

/// Saved products for `user_id`, most recently added first
pub async fn find_by_user(pool: &PgPool, user_id: i64) -> ServiceResult<Vec<WishlistItem>> {
    let entries = sqlx::query_as::<_, WishlistEntry>(
        "SELECT user_id, product_id, created_at FROM wishlist WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let ids: Vec<i64> = entries.iter().map(|e| e.product_id).collect();
    let mut by_id: HashMap<i64, _> = products::find_by_ids(pool, &ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    Ok(entries
        .into_iter()
        .filter_map(|e| {
            by_id.remove(&e.product_id).map(|product| WishlistItem {
                product,
                added_at: e.created_at,
            })
        })
        .collect())
}

pub async fn add(pool: &PgPool, user_id: i64, product_id: i64) -> ServiceResult<WishlistEntry> {
    if products::find_by_id(pool, product_id).await?.is_none() {
        return Err(AppError::new(ErrorCode::ProductNotFound)
            .with_detail("product_id", product_id)
            .into());
    }

    let entry = sqlx::query_as::<_, WishlistEntry>(
        "INSERT INTO wishlist (user_id, product_id, created_at) VALUES ($1, $2, $3) \
         RETURNING user_id, product_id, created_at",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(now_millis())
    .fetch_one(pool)
    .await
    .map_err(|e| unique_or(e, || AppError::new(ErrorCode::WishlistItemExists)))?;
    Ok(entry)
}

pub async fn remove(pool: &PgPool, user_id: i64, product_id: i64) -> ServiceResult<()> {
    let result = sqlx::query("DELETE FROM wishlist WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::new(ErrorCode::WishlistItemNotFound).into());
    }
    Ok(())
}
