//! Product variant database operations

use shared::error::{AppError, ErrorCode};
use shared::models::{ProductVariant, VariantCreate, VariantOption, VariantUpdate};
use shared::util::{now_millis, snowflake_id};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::core::ServiceResult;
use crate::core::error::unique_or;

const COLUMNS: &str =
    "id, product_id, sku, price, compare_price, stock, options, image, is_active, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct VariantRow {
    id: i64,
    product_id: i64,
    sku: String,
    price: f64,
    compare_price: Option<f64>,
    stock: i32,
    options: Json<Vec<VariantOption>>,
    image: Option<String>,
    is_active: bool,
    created_at: i64,
    updated_at: i64,
}

impl From<VariantRow> for ProductVariant {
    fn from(r: VariantRow) -> Self {
        Self {
            id: r.id,
            product_id: r.product_id,
            sku: r.sku,
            price: r.price,
            compare_price: r.compare_price,
            stock: r.stock,
            options: r.options.0,
            image: r.image,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

fn sku_exists(sku: &str) -> AppError {
    AppError::with_message(
        ErrorCode::VariantSkuExists,
        format!("Variant SKU '{sku}' already exists"),
    )
}

pub async fn find_by_product(pool: &PgPool, product_id: i64) -> ServiceResult<Vec<ProductVariant>> {
    let rows = sqlx::query_as::<_, VariantRow>(&format!(
        "SELECT {COLUMNS} FROM product_variants WHERE product_id = $1 ORDER BY created_at, id"
    ))
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn find_by_id(
    conn: &mut PgConnection,
    product_id: i64,
    variant_id: i64,
) -> ServiceResult<Option<ProductVariant>> {
    let row = sqlx::query_as::<_, VariantRow>(&format!(
        "SELECT {COLUMNS} FROM product_variants WHERE id = $1 AND product_id = $2"
    ))
    .bind(variant_id)
    .bind(product_id)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(Into::into))
}

/// Insert a variant (usable inside the product-create transaction)
pub async fn insert(
    conn: &mut PgConnection,
    product_id: i64,
    data: &VariantCreate,
) -> ServiceResult<ProductVariant> {
    let now = now_millis();
    let sku = data.sku.trim();
    let row = sqlx::query_as::<_, VariantRow>(&format!(
        "INSERT INTO product_variants (id, product_id, sku, price, compare_price, stock, options, image, is_active, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, $9, $9) RETURNING {COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(product_id)
    .bind(sku)
    .bind(data.price)
    .bind(data.compare_price)
    .bind(data.stock.unwrap_or(0))
    .bind(Json(&data.options))
    .bind(&data.image)
    .bind(now)
    .fetch_one(conn)
    .await
    .map_err(|e| unique_or(e, || sku_exists(sku)))?;
    Ok(row.into())
}

/// Insert a variant and flag the product as having variations
pub async fn create(
    pool: &PgPool,
    product_id: i64,
    data: &VariantCreate,
) -> ServiceResult<ProductVariant> {
    let mut tx = pool.begin().await?;
    let variant = insert(&mut tx, product_id, data).await?;
    sqlx::query("UPDATE products SET has_variations = TRUE, updated_at = $2 WHERE id = $1")
        .bind(product_id)
        .bind(now_millis())
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(variant)
}

pub async fn update(
    pool: &PgPool,
    product_id: i64,
    variant_id: i64,
    data: &VariantUpdate,
) -> ServiceResult<ProductVariant> {
    let sku = data.sku.as_deref().map(str::trim);
    let row = sqlx::query_as::<_, VariantRow>(&format!(
        "UPDATE product_variants SET \
            sku = COALESCE($3, sku), \
            price = COALESCE($4, price), \
            compare_price = COALESCE($5, compare_price), \
            stock = COALESCE($6, stock), \
            options = COALESCE($7, options), \
            image = COALESCE($8, image), \
            is_active = COALESCE($9, is_active), \
            updated_at = $10 \
         WHERE id = $1 AND product_id = $2 RETURNING {COLUMNS}"
    ))
    .bind(variant_id)
    .bind(product_id)
    .bind(sku)
    .bind(data.price)
    .bind(data.compare_price)
    .bind(data.stock)
    .bind(data.options.as_ref().map(Json))
    .bind(&data.image)
    .bind(data.is_active)
    .bind(now_millis())
    .fetch_optional(pool)
    .await
    .map_err(|e| unique_or(e, || sku_exists(sku.unwrap_or_default())))?
    .ok_or_else(|| AppError::new(ErrorCode::VariantNotFound))?;
    Ok(row.into())
}

/// Delete a variant; the product loses `has_variations` with its last variant
pub async fn delete(pool: &PgPool, product_id: i64, variant_id: i64) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query("DELETE FROM product_variants WHERE id = $1 AND product_id = $2")
        .bind(variant_id)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::new(ErrorCode::VariantNotFound).into());
    }
    sqlx::query(
        "UPDATE products SET has_variations = EXISTS (SELECT 1 FROM product_variants WHERE product_id = $1), \
         updated_at = $2 WHERE id = $1",
    )
    .bind(product_id)
    .bind(now_millis())
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(())
}

pub async fn find_by_ids(pool: &PgPool, ids: &[i64]) -> ServiceResult<Vec<ProductVariant>> {
    if ids.is_empty() {
        return Ok(vec![]);
    }
    let rows = sqlx::query_as::<_, VariantRow>(&format!(
        "SELECT {COLUMNS} FROM product_variants WHERE id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}
