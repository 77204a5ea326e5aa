//! Brand database operations

use shared::error::{AppError, ErrorCode};
use shared::models::{Brand, BrandCreate, BrandUpdate};
use shared::util::{now_millis, snowflake_id, slugify};
use sqlx::PgPool;

use crate::core::ServiceResult;
use crate::core::error::unique_or;

const COLUMNS: &str = "id, name, slug, description, logo, is_active, created_at, updated_at";

fn slug_exists(slug: &str) -> AppError {
    AppError::with_message(
        ErrorCode::BrandSlugExists,
        format!("Brand slug '{slug}' already exists"),
    )
}

pub async fn find_all(pool: &PgPool, include_inactive: bool) -> ServiceResult<Vec<Brand>> {
    let rows = sqlx::query_as::<_, Brand>(&format!(
        "SELECT {COLUMNS} FROM brands WHERE is_active OR $1 ORDER BY name"
    ))
    .bind(include_inactive)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> ServiceResult<Option<Brand>> {
    let row = sqlx::query_as::<_, Brand>(&format!("SELECT {COLUMNS} FROM brands WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Resolve an id-or-slug path segment
pub async fn find_by_key(pool: &PgPool, key: &str) -> ServiceResult<Option<Brand>> {
    if let Ok(id) = key.parse::<i64>()
        && let Some(found) = find_by_id(pool, id).await?
    {
        return Ok(Some(found));
    }
    let row = sqlx::query_as::<_, Brand>(&format!("SELECT {COLUMNS} FROM brands WHERE slug = $1"))
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &PgPool, data: BrandCreate) -> ServiceResult<Brand> {
    let slug = data
        .slug
        .as_deref()
        .map(slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| slugify(&data.name));
    if slug.is_empty() {
        return Err(AppError::invalid_field("slug", "Cannot derive a slug from the name").into());
    }

    let now = now_millis();
    let row = sqlx::query_as::<_, Brand>(&format!(
        "INSERT INTO brands (id, name, slug, description, logo, is_active, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, TRUE, $6, $6) RETURNING {COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(data.name.trim())
    .bind(&slug)
    .bind(&data.description)
    .bind(&data.logo)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| unique_or(e, || slug_exists(&slug)))?;
    Ok(row)
}

pub async fn update(pool: &PgPool, id: i64, data: BrandUpdate) -> ServiceResult<Brand> {
    let slug = data.slug.as_deref().map(slugify).filter(|s| !s.is_empty());
    let row = sqlx::query_as::<_, Brand>(&format!(
        "UPDATE brands SET \
            name = COALESCE($2, name), \
            slug = COALESCE($3, slug), \
            description = COALESCE($4, description), \
            logo = COALESCE($5, logo), \
            is_active = COALESCE($6, is_active), \
            updated_at = $7 \
         WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(data.name.as_deref().map(str::trim))
    .bind(&slug)
    .bind(&data.description)
    .bind(&data.logo)
    .bind(data.is_active)
    .bind(now_millis())
    .fetch_optional(pool)
    .await
    .map_err(|e| unique_or(e, || slug_exists(slug.as_deref().unwrap_or_default())))?
    .ok_or_else(|| AppError::new(ErrorCode::BrandNotFound))?;
    Ok(row)
}

/// Delete a brand. Blocked while products reference it.
pub async fn delete(pool: &PgPool, id: i64) -> ServiceResult<()> {
    let (products,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE brand_id = $1")
        .bind(id)
        .fetch_one(pool)
        .await?;
    if products > 0 {
        return Err(AppError::with_message(
            ErrorCode::BrandHasProducts,
            format!("Brand has {products} products"),
        )
        .with_detail("count", products)
        .into());
    }

    let result = sqlx::query("DELETE FROM brands WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::new(ErrorCode::BrandNotFound).into());
    }
    Ok(())
}
