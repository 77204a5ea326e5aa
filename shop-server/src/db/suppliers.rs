//! Supplier database operations

use shared::error::{AppError, ErrorCode};
use shared::models::{Supplier, SupplierCreate, SupplierUpdate};
use shared::response::PageQuery;
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use super::like_pattern;
use crate::core::ServiceResult;

const COLUMNS: &str =
    "id, name, contact_person, email, phone, address, is_active, created_at, updated_at";

pub async fn find_page(
    pool: &PgPool,
    search: Option<&str>,
    page: &PageQuery,
) -> ServiceResult<(Vec<Supplier>, i64)> {
    let pattern = search.filter(|s| !s.trim().is_empty()).map(like_pattern);
    let rows = sqlx::query_as::<_, Supplier>(&format!(
        "SELECT {COLUMNS} FROM suppliers \
         WHERE ($1::text IS NULL OR name ILIKE $1 OR contact_person ILIKE $1) \
         ORDER BY name LIMIT $2 OFFSET $3"
    ))
    .bind(&pattern)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM suppliers \
         WHERE ($1::text IS NULL OR name ILIKE $1 OR contact_person ILIKE $1)",
    )
    .bind(&pattern)
    .fetch_one(pool)
    .await?;
    Ok((rows, total))
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> ServiceResult<Option<Supplier>> {
    let row = sqlx::query_as::<_, Supplier>(&format!(
        "SELECT {COLUMNS} FROM suppliers WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn create(pool: &PgPool, data: SupplierCreate) -> ServiceResult<Supplier> {
    let now = now_millis();
    let row = sqlx::query_as::<_, Supplier>(&format!(
        "INSERT INTO suppliers (id, name, contact_person, email, phone, address, is_active, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $7) RETURNING {COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(data.name.trim())
    .bind(&data.contact_person)
    .bind(data.email.as_deref().map(|e| e.trim().to_lowercase()))
    .bind(&data.phone)
    .bind(&data.address)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn update(pool: &PgPool, id: i64, data: SupplierUpdate) -> ServiceResult<Supplier> {
    let row = sqlx::query_as::<_, Supplier>(&format!(
        "UPDATE suppliers SET \
            name = COALESCE($2, name), \
            contact_person = COALESCE($3, contact_person), \
            email = COALESCE($4, email), \
            phone = COALESCE($5, phone), \
            address = COALESCE($6, address), \
            is_active = COALESCE($7, is_active), \
            updated_at = $8 \
         WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(data.name.as_deref().map(str::trim))
    .bind(&data.contact_person)
    .bind(data.email.as_deref().map(|e| e.trim().to_lowercase()))
    .bind(&data.phone)
    .bind(&data.address)
    .bind(data.is_active)
    .bind(now_millis())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::SupplierNotFound))?;
    Ok(row)
}

/// Delete a supplier. Blocked while purchases reference it.
pub async fn delete(pool: &PgPool, id: i64) -> ServiceResult<()> {
    let (purchases,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM purchases WHERE supplier_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
    if purchases > 0 {
        return Err(AppError::new(ErrorCode::SupplierHasPurchases)
            .with_detail("count", purchases)
            .into());
    }

    let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::new(ErrorCode::SupplierNotFound).into());
    }
    Ok(())
}
