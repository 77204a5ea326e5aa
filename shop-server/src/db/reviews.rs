//! Review database operations
//!
//! A review is accepted only from a customer who received the product
//! (a delivered order containing it), one per customer and product. Only
//! approved reviews count toward the product's rating.

use shared::error::{AppError, ErrorCode};
use shared::models::{ModerationStatus, Review, ReviewCreate};
use shared::response::PageQuery;
use shared::util::{now_millis, snowflake_id};
use sqlx::{PgConnection, PgPool};

use super::{orders, products};
use crate::core::ServiceResult;
use crate::core::error::unique_or;

const SELECT: &str = "SELECT r.id, r.product_id, r.user_id, u.name AS user_name, r.order_id, r.rating, \
    r.comment, r.status, r.created_at, r.updated_at \
    FROM reviews r JOIN users u ON u.id = r.user_id";

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    product_id: i64,
    user_id: i64,
    user_name: String,
    order_id: i64,
    rating: i32,
    comment: Option<String>,
    status: String,
    created_at: i64,
    updated_at: i64,
}

impl From<ReviewRow> for Review {
    fn from(r: ReviewRow) -> Self {
        Self {
            id: r.id,
            product_id: r.product_id,
            user_id: r.user_id,
            user_name: r.user_name,
            order_id: r.order_id,
            rating: r.rating,
            comment: r.comment,
            status: ModerationStatus::from_db(&r.status),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Approved reviews for a product, newest first
pub async fn find_approved(
    pool: &PgPool,
    product_id: i64,
    page: &PageQuery,
) -> ServiceResult<(Vec<Review>, i64)> {
    let rows = sqlx::query_as::<_, ReviewRow>(&format!(
        "{SELECT} WHERE r.product_id = $1 AND r.status = 'approved' \
         ORDER BY r.created_at DESC LIMIT $2 OFFSET $3"
    ))
    .bind(product_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;
    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM reviews WHERE product_id = $1 AND status = 'approved'",
    )
    .bind(product_id)
    .fetch_one(pool)
    .await?;
    Ok((rows.into_iter().map(Into::into).collect(), total))
}

/// Moderation queue, optionally filtered by status
pub async fn find_page(
    pool: &PgPool,
    status: Option<ModerationStatus>,
    page: &PageQuery,
) -> ServiceResult<(Vec<Review>, i64)> {
    let status = status.map(|s| s.as_str());
    let rows = sqlx::query_as::<_, ReviewRow>(&format!(
        "{SELECT} WHERE ($1::text IS NULL OR r.status = $1) \
         ORDER BY r.created_at DESC LIMIT $2 OFFSET $3"
    ))
    .bind(status)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;
    let (total,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM reviews WHERE ($1::text IS NULL OR status = $1)")
            .bind(status)
            .fetch_one(pool)
            .await?;
    Ok((rows.into_iter().map(Into::into).collect(), total))
}

async fn find_by_id(conn: &mut PgConnection, id: i64) -> ServiceResult<Review> {
    let row = sqlx::query_as::<_, ReviewRow>(&format!("{SELECT} WHERE r.id = $1"))
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ReviewNotFound))?;
    Ok(row.into())
}

/// Submit a review. It starts in `pending` and does not affect the rating
/// until approved.
pub async fn create(
    pool: &PgPool,
    user_id: i64,
    product_id: i64,
    data: &ReviewCreate,
) -> ServiceResult<Review> {
    if products::find_by_id(pool, product_id).await?.is_none() {
        return Err(AppError::new(ErrorCode::ProductNotFound).into());
    }
    let order_id = orders::find_delivered_purchase(pool, user_id, product_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ReviewNotEligible))?;

    let id = snowflake_id();
    let now = now_millis();
    sqlx::query(
        "INSERT INTO reviews (id, product_id, user_id, order_id, rating, comment, status, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)",
    )
    .bind(id)
    .bind(product_id)
    .bind(user_id)
    .bind(order_id)
    .bind(data.rating)
    .bind(&data.comment)
    .bind(ModerationStatus::Pending.as_str())
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| unique_or(e, || AppError::new(ErrorCode::ReviewAlreadyExists)))?;

    let mut conn = pool.acquire().await?;
    find_by_id(&mut conn, id).await
}

/// Change moderation status and refresh the product's rating aggregate
pub async fn set_status(pool: &PgPool, id: i64, status: ModerationStatus) -> ServiceResult<Review> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query("UPDATE reviews SET status = $2, updated_at = $3 WHERE id = $1")
        .bind(id)
        .bind(status.as_str())
        .bind(now_millis())
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::new(ErrorCode::ReviewNotFound).into());
    }
    let review = find_by_id(&mut tx, id).await?;
    products::refresh_rating(&mut tx, review.product_id).await?;
    tx.commit().await?;
    Ok(review)
}

pub async fn delete(pool: &PgPool, id: i64) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;
    let (product_id,): (i64,) =
        sqlx::query_as("DELETE FROM reviews WHERE id = $1 RETURNING product_id")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::ReviewNotFound))?;
    products::refresh_rating(&mut tx, product_id).await?;
    tx.commit().await?;
    Ok(())
}
