//! Product database operations

use shared::error::{AppError, ErrorCode};
use shared::models::{Product, ProductCreate, ProductDetail, ProductQuery, ProductUpdate};
use shared::response::PageQuery;
use shared::util::{now_millis, snowflake_id, slugify};
use sqlx::{PgConnection, PgPool};

use super::{like_pattern, variants};
use crate::core::ServiceResult;
use crate::core::error::unique_or;

const COLUMNS: &str = "id, name, slug, description, sku, price, compare_price, sale_price, cost_price, \
    stock, low_stock_threshold, category_id, brand_id, images, is_featured, is_active, has_variations, \
    flash_sale_price, flash_sale_start, flash_sale_end, rating, num_reviews, created_at, updated_at";

/// Shared WHERE clause for listing and counting. Binds:
/// $1 include_inactive, $2 category, $3 brand, $4 min_price, $5 max_price,
/// $6 featured, $7 search pattern
const FILTER: &str = "($1 OR is_active) \
    AND ($2::bigint IS NULL OR category_id = $2) \
    AND ($3::bigint IS NULL OR brand_id = $3) \
    AND ($4::float8 IS NULL OR COALESCE(sale_price, price) >= $4) \
    AND ($5::float8 IS NULL OR COALESCE(sale_price, price) <= $5) \
    AND ($6::bool IS NULL OR is_featured = $6) \
    AND ($7::text IS NULL OR name ILIKE $7 OR description ILIKE $7)";

fn slug_exists(slug: &str) -> AppError {
    AppError::with_message(
        ErrorCode::ProductSlugExists,
        format!("Product slug '{slug}' already exists"),
    )
}

/// Filtered, sorted, paginated catalog listing. Returns the page and the total count.
pub async fn find_page(
    pool: &PgPool,
    query: &ProductQuery,
    page: &PageQuery,
    include_inactive: bool,
) -> ServiceResult<(Vec<Product>, i64)> {
    let pattern = query
        .q
        .as_deref()
        .filter(|q| !q.trim().is_empty())
        .map(like_pattern);
    let order_by = query.sort.unwrap_or_default().order_by();

    let rows = sqlx::query_as::<_, Product>(&format!(
        "SELECT {COLUMNS} FROM products WHERE {FILTER} ORDER BY {order_by}, id LIMIT $8 OFFSET $9"
    ))
    .bind(include_inactive)
    .bind(query.category)
    .bind(query.brand)
    .bind(query.min_price)
    .bind(query.max_price)
    .bind(query.featured)
    .bind(&pattern)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let (total,): (i64,) =
        sqlx::query_as(&format!("SELECT COUNT(*) FROM products WHERE {FILTER}"))
            .bind(include_inactive)
            .bind(query.category)
            .bind(query.brand)
            .bind(query.min_price)
            .bind(query.max_price)
            .bind(query.featured)
            .bind(&pattern)
            .fetch_one(pool)
            .await?;

    Ok((rows, total))
}

pub async fn find_featured(pool: &PgPool, limit: i64) -> ServiceResult<Vec<Product>> {
    let rows = sqlx::query_as::<_, Product>(&format!(
        "SELECT {COLUMNS} FROM products WHERE is_active AND is_featured \
         ORDER BY created_at DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> ServiceResult<Option<Product>> {
    let row = sqlx::query_as::<_, Product>(&format!("SELECT {COLUMNS} FROM products WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Row-locking lookup for use inside a transaction
pub async fn find_for_update(conn: &mut PgConnection, id: i64) -> ServiceResult<Option<Product>> {
    let row = sqlx::query_as::<_, Product>(&format!(
        "SELECT {COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

pub async fn find_by_ids(pool: &PgPool, ids: &[i64]) -> ServiceResult<Vec<Product>> {
    if ids.is_empty() {
        return Ok(vec![]);
    }
    let rows = sqlx::query_as::<_, Product>(&format!(
        "SELECT {COLUMNS} FROM products WHERE id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Resolve an id-or-slug path segment
pub async fn find_by_key(pool: &PgPool, key: &str) -> ServiceResult<Option<Product>> {
    if let Ok(id) = key.parse::<i64>()
        && let Some(found) = find_by_id(pool, id).await?
    {
        return Ok(Some(found));
    }
    let row =
        sqlx::query_as::<_, Product>(&format!("SELECT {COLUMNS} FROM products WHERE slug = $1"))
            .bind(key)
            .fetch_optional(pool)
            .await?;
    Ok(row)
}

/// Product plus its variants
pub async fn find_detail(pool: &PgPool, key: &str) -> ServiceResult<Option<ProductDetail>> {
    let Some(product) = find_by_key(pool, key).await? else {
        return Ok(None);
    };
    let variants = variants::find_by_product(pool, product.id).await?;
    Ok(Some(ProductDetail { product, variants }))
}

async fn check_references(
    pool: &PgPool,
    category_id: Option<i64>,
    brand_id: Option<i64>,
) -> ServiceResult<()> {
    if let Some(id) = category_id {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
                .bind(id)
                .fetch_one(pool)
                .await?;
        if !exists {
            return Err(AppError::new(ErrorCode::CategoryNotFound)
                .with_detail("category_id", id)
                .into());
        }
    }
    if let Some(id) = brand_id {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM brands WHERE id = $1)")
                .bind(id)
                .fetch_one(pool)
                .await?;
        if !exists {
            return Err(AppError::new(ErrorCode::BrandNotFound)
                .with_detail("brand_id", id)
                .into());
        }
    }
    Ok(())
}

/// Create a product and its initial variants in one transaction
pub async fn create(pool: &PgPool, data: ProductCreate) -> ServiceResult<ProductDetail> {
    check_references(pool, data.category_id, data.brand_id).await?;

    let slug = data
        .slug
        .as_deref()
        .map(slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| slugify(&data.name));
    if slug.is_empty() {
        return Err(AppError::invalid_field("slug", "Cannot derive a slug from the name").into());
    }

    let variant_inputs = data.variants.clone().unwrap_or_default();
    let has_variations = data.has_variations.unwrap_or(false) || !variant_inputs.is_empty();
    let now = now_millis();

    let mut tx = pool.begin().await?;
    let product = sqlx::query_as::<_, Product>(&format!(
        "INSERT INTO products (id, name, slug, description, sku, price, compare_price, sale_price, cost_price, \
            stock, low_stock_threshold, category_id, brand_id, images, is_featured, is_active, has_variations, \
            flash_sale_price, flash_sale_start, flash_sale_end, rating, num_reviews, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, TRUE, $16, $17, $18, $19, 0, 0, $20, $20) \
         RETURNING {COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(data.name.trim())
    .bind(&slug)
    .bind(&data.description)
    .bind(&data.sku)
    .bind(data.price)
    .bind(data.compare_price)
    .bind(data.sale_price)
    .bind(data.cost_price)
    .bind(data.stock.unwrap_or(0))
    .bind(data.low_stock_threshold.unwrap_or(5))
    .bind(data.category_id)
    .bind(data.brand_id)
    .bind(data.images.clone().unwrap_or_default())
    .bind(data.is_featured.unwrap_or(false))
    .bind(has_variations)
    .bind(data.flash_sale_price)
    .bind(data.flash_sale_start)
    .bind(data.flash_sale_end)
    .bind(now)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| unique_or(e, || slug_exists(&slug)))?;

    let mut created = Vec::with_capacity(variant_inputs.len());
    for input in &variant_inputs {
        created.push(variants::insert(&mut tx, product.id, input).await?);
    }
    tx.commit().await?;

    Ok(ProductDetail {
        product,
        variants: created,
    })
}

pub async fn update(pool: &PgPool, id: i64, data: ProductUpdate) -> ServiceResult<Product> {
    check_references(pool, data.category_id, data.brand_id).await?;

    let slug = data.slug.as_deref().map(slugify).filter(|s| !s.is_empty());
    let row = sqlx::query_as::<_, Product>(&format!(
        "UPDATE products SET \
            name = COALESCE($2, name), \
            slug = COALESCE($3, slug), \
            description = COALESCE($4, description), \
            sku = COALESCE($5, sku), \
            price = COALESCE($6, price), \
            compare_price = COALESCE($7, compare_price), \
            sale_price = CASE WHEN $8 THEN NULL ELSE COALESCE($9, sale_price) END, \
            cost_price = COALESCE($10, cost_price), \
            stock = COALESCE($11, stock), \
            low_stock_threshold = COALESCE($12, low_stock_threshold), \
            category_id = COALESCE($13, category_id), \
            brand_id = COALESCE($14, brand_id), \
            images = COALESCE($15, images), \
            is_featured = COALESCE($16, is_featured), \
            is_active = COALESCE($17, is_active), \
            has_variations = COALESCE($18, has_variations), \
            flash_sale_price = CASE WHEN $19 THEN NULL ELSE COALESCE($20, flash_sale_price) END, \
            flash_sale_start = CASE WHEN $19 THEN NULL ELSE COALESCE($21, flash_sale_start) END, \
            flash_sale_end = CASE WHEN $19 THEN NULL ELSE COALESCE($22, flash_sale_end) END, \
            updated_at = $23 \
         WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(data.name.as_deref().map(str::trim))
    .bind(&slug)
    .bind(&data.description)
    .bind(&data.sku)
    .bind(data.price)
    .bind(data.compare_price)
    .bind(data.clear_sale_price)
    .bind(data.sale_price)
    .bind(data.cost_price)
    .bind(data.stock)
    .bind(data.low_stock_threshold)
    .bind(data.category_id)
    .bind(data.brand_id)
    .bind(&data.images)
    .bind(data.is_featured)
    .bind(data.is_active)
    .bind(data.has_variations)
    .bind(data.clear_flash_sale)
    .bind(data.flash_sale_price)
    .bind(data.flash_sale_start)
    .bind(data.flash_sale_end)
    .bind(now_millis())
    .fetch_optional(pool)
    .await
    .map_err(|e| unique_or(e, || slug_exists(slug.as_deref().unwrap_or_default())))?
    .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;
    Ok(row)
}

/// Delete a product and return it, so the caller can release its images
pub async fn delete(pool: &PgPool, id: i64) -> ServiceResult<Product> {
    let row = sqlx::query_as::<_, Product>(&format!(
        "DELETE FROM products WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;
    Ok(row)
}

/// Whether any remaining product, category, brand or variant still points at `url`
pub async fn image_in_use(pool: &PgPool, url: &str) -> ServiceResult<bool> {
    let (in_use,): (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM products WHERE $1 = ANY(images)) \
             OR EXISTS (SELECT 1 FROM product_variants WHERE image = $1) \
             OR EXISTS (SELECT 1 FROM categories WHERE image = $1) \
             OR EXISTS (SELECT 1 FROM brands WHERE logo = $1)",
    )
    .bind(url)
    .fetch_one(pool)
    .await?;
    Ok(in_use)
}

/// Recompute `rating` (mean of approved ratings, one decimal) and `num_reviews`
pub async fn refresh_rating(conn: &mut PgConnection, product_id: i64) -> ServiceResult<()> {
    let ratings: Vec<(i32,)> =
        sqlx::query_as("SELECT rating FROM reviews WHERE product_id = $1 AND status = 'approved'")
            .bind(product_id)
            .fetch_all(&mut *conn)
            .await?;
    let ratings: Vec<i32> = ratings.into_iter().map(|(r,)| r).collect();
    let average = shared::pricing::average_rating(&ratings);

    sqlx::query("UPDATE products SET rating = $2, num_reviews = $3, updated_at = $4 WHERE id = $1")
        .bind(product_id)
        .bind(average)
        .bind(ratings.len() as i32)
        .bind(now_millis())
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn count_active(pool: &PgPool) -> ServiceResult<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE is_active")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn count_low_stock(pool: &PgPool) -> ServiceResult<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM products WHERE is_active AND NOT has_variations AND stock <= low_stock_threshold",
    )
    .fetch_one(pool)
    .await?;
    Ok(count)
}
