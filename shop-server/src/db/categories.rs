//! Category database operations

use std::collections::HashMap;

use shared::error::{AppError, ErrorCode};
use shared::models::{Category, CategoryCreate, CategoryUpdate, creates_cycle};
use shared::util::{now_millis, snowflake_id, slugify};
use sqlx::PgPool;

use crate::core::ServiceResult;
use crate::core::error::unique_or;

const COLUMNS: &str =
    "id, name, slug, description, image, parent_id, sort_order, is_active, created_at, updated_at";

fn slug_exists(slug: &str) -> AppError {
    AppError::with_message(
        ErrorCode::CategorySlugExists,
        format!("Category slug '{slug}' already exists"),
    )
}

pub async fn find_all(pool: &PgPool, include_inactive: bool) -> ServiceResult<Vec<Category>> {
    let rows = sqlx::query_as::<_, Category>(&format!(
        "SELECT {COLUMNS} FROM categories WHERE is_active OR $1 ORDER BY sort_order, name"
    ))
    .bind(include_inactive)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> ServiceResult<Option<Category>> {
    let row = sqlx::query_as::<_, Category>(&format!(
        "SELECT {COLUMNS} FROM categories WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Resolve `{id}` path segments that may be a numeric id or a slug
pub async fn find_by_key(pool: &PgPool, key: &str) -> ServiceResult<Option<Category>> {
    if let Ok(id) = key.parse::<i64>()
        && let Some(found) = find_by_id(pool, id).await?
    {
        return Ok(Some(found));
    }
    let row = sqlx::query_as::<_, Category>(&format!(
        "SELECT {COLUMNS} FROM categories WHERE slug = $1"
    ))
    .bind(key)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

async fn require_parent(pool: &PgPool, parent_id: i64) -> ServiceResult<()> {
    if find_by_id(pool, parent_id).await?.is_none() {
        return Err(AppError::with_message(
            ErrorCode::CategoryNotFound,
            format!("Parent category {parent_id} not found"),
        )
        .into());
    }
    Ok(())
}

pub async fn create(pool: &PgPool, data: CategoryCreate) -> ServiceResult<Category> {
    if let Some(parent_id) = data.parent_id {
        require_parent(pool, parent_id).await?;
    }
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
    let row = sqlx::query_as::<_, Category>(&format!(
        "INSERT INTO categories (id, name, slug, description, image, parent_id, sort_order, is_active, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8, $8) RETURNING {COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(data.name.trim())
    .bind(&slug)
    .bind(&data.description)
    .bind(&data.image)
    .bind(data.parent_id)
    .bind(data.sort_order.unwrap_or(0))
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| unique_or(e, || slug_exists(&slug)))?;
    Ok(row)
}

pub async fn update(pool: &PgPool, id: i64, data: CategoryUpdate) -> ServiceResult<Category> {
    if find_by_id(pool, id).await?.is_none() {
        return Err(AppError::new(ErrorCode::CategoryNotFound).into());
    }

    if let Some(parent_id) = data.parent_id.filter(|_| !data.clear_parent) {
        require_parent(pool, parent_id).await?;
        let parents: Vec<(i64, Option<i64>)> =
            sqlx::query_as("SELECT id, parent_id FROM categories")
                .fetch_all(pool)
                .await?;
        let parent_of: HashMap<i64, Option<i64>> = parents.into_iter().collect();
        if creates_cycle(id, parent_id, &parent_of) {
            return Err(AppError::new(ErrorCode::CategoryCycle)
                .with_detail("parent_id", parent_id)
                .into());
        }
    }

    let slug = data.slug.as_deref().map(slugify).filter(|s| !s.is_empty());
    let row = sqlx::query_as::<_, Category>(&format!(
        "UPDATE categories SET \
            name = COALESCE($2, name), \
            slug = COALESCE($3, slug), \
            description = COALESCE($4, description), \
            image = COALESCE($5, image), \
            parent_id = CASE WHEN $6 THEN NULL ELSE COALESCE($7, parent_id) END, \
            sort_order = COALESCE($8, sort_order), \
            is_active = COALESCE($9, is_active), \
            updated_at = $10 \
         WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(data.name.as_deref().map(str::trim))
    .bind(&slug)
    .bind(&data.description)
    .bind(&data.image)
    .bind(data.clear_parent)
    .bind(data.parent_id)
    .bind(data.sort_order)
    .bind(data.is_active)
    .bind(now_millis())
    .fetch_optional(pool)
    .await
    .map_err(|e| unique_or(e, || slug_exists(slug.as_deref().unwrap_or_default())))?
    .ok_or_else(|| AppError::new(ErrorCode::CategoryNotFound))?;
    Ok(row)
}

/// Delete a category. Blocked while products or child categories reference it.
pub async fn delete(pool: &PgPool, id: i64) -> ServiceResult<()> {
    let (products,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM products WHERE category_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
    if products > 0 {
        return Err(AppError::with_message(
            ErrorCode::CategoryHasProducts,
            format!("Category has {products} products"),
        )
        .with_detail("count", products)
        .into());
    }

    let (children,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM categories WHERE parent_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
    if children > 0 {
        return Err(AppError::new(ErrorCode::CategoryHasChildren)
            .with_detail("count", children)
            .into());
    }

    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::new(ErrorCode::CategoryNotFound).into());
    }
    Ok(())
}
