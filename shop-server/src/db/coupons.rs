//! Coupon database operations

use shared::error::{AppError, ErrorCode};
use shared::models::{Coupon, CouponCreate, CouponType, CouponUpdate, normalize_code};
use shared::response::PageQuery;
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use crate::core::ServiceResult;
use crate::core::error::unique_or;

const COLUMNS: &str =
    "id, code, coupon_type, value, min_purchase, expires_at, is_active, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct CouponRow {
    id: i64,
    code: String,
    coupon_type: String,
    value: f64,
    min_purchase: Option<f64>,
    expires_at: Option<i64>,
    is_active: bool,
    created_at: i64,
    updated_at: i64,
}

impl From<CouponRow> for Coupon {
    fn from(r: CouponRow) -> Self {
        Self {
            id: r.id,
            code: r.code,
            coupon_type: CouponType::from_db(&r.coupon_type),
            value: r.value,
            min_purchase: r.min_purchase,
            expires_at: r.expires_at,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

fn code_exists(code: &str) -> AppError {
    AppError::with_message(
        ErrorCode::CouponCodeExists,
        format!("Coupon code '{code}' already exists"),
    )
}

pub async fn find_page(pool: &PgPool, page: &PageQuery) -> ServiceResult<(Vec<Coupon>, i64)> {
    let rows = sqlx::query_as::<_, CouponRow>(&format!(
        "SELECT {COLUMNS} FROM coupons ORDER BY created_at DESC LIMIT $1 OFFSET $2"
    ))
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM coupons")
        .fetch_one(pool)
        .await?;
    Ok((rows.into_iter().map(Into::into).collect(), total))
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> ServiceResult<Option<Coupon>> {
    let row = sqlx::query_as::<_, CouponRow>(&format!("SELECT {COLUMNS} FROM coupons WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Into::into))
}

pub async fn find_by_code(pool: &PgPool, code: &str) -> ServiceResult<Option<Coupon>> {
    let row = sqlx::query_as::<_, CouponRow>(&format!(
        "SELECT {COLUMNS} FROM coupons WHERE code = $1"
    ))
    .bind(normalize_code(code))
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Into::into))
}

pub async fn create(pool: &PgPool, data: CouponCreate) -> ServiceResult<Coupon> {
    let code = normalize_code(&data.code);
    let now = now_millis();
    let row = sqlx::query_as::<_, CouponRow>(&format!(
        "INSERT INTO coupons (id, code, coupon_type, value, min_purchase, expires_at, is_active, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $7) RETURNING {COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(&code)
    .bind(data.coupon_type.as_str())
    .bind(data.value)
    .bind(data.min_purchase)
    .bind(data.expires_at)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| unique_or(e, || code_exists(&code)))?;
    Ok(row.into())
}

pub async fn update(pool: &PgPool, id: i64, data: CouponUpdate) -> ServiceResult<Coupon> {
    let code = data.code.as_deref().map(normalize_code);
    let row = sqlx::query_as::<_, CouponRow>(&format!(
        "UPDATE coupons SET \
            code = COALESCE($2, code), \
            coupon_type = COALESCE($3, coupon_type), \
            value = COALESCE($4, value), \
            min_purchase = COALESCE($5, min_purchase), \
            expires_at = COALESCE($6, expires_at), \
            is_active = COALESCE($7, is_active), \
            updated_at = $8 \
         WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(&code)
    .bind(data.coupon_type.map(|t| t.as_str()))
    .bind(data.value)
    .bind(data.min_purchase)
    .bind(data.expires_at)
    .bind(data.is_active)
    .bind(now_millis())
    .fetch_optional(pool)
    .await
    .map_err(|e| unique_or(e, || code_exists(code.as_deref().unwrap_or_default())))?
    .ok_or_else(|| AppError::new(ErrorCode::CouponNotFound))?;
    Ok(row.into())
}

pub async fn delete(pool: &PgPool, id: i64) -> ServiceResult<()> {
    let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::new(ErrorCode::CouponNotFound).into());
    }
    Ok(())
}
