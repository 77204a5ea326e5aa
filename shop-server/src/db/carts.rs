//! Cart database operations
//!
//! One cart per user. Lines store only ids, quantity and a variant snapshot;
//! names, prices and totals are resolved against the live catalog on read.

use std::collections::HashMap;

use shared::error::{AppError, ErrorCode};
use shared::models::{
    CartItem, CartItemAdd, CartLineView, CartView, Product, ProductVariant, VariationSnapshot,
};
use shared::pricing::{CartLine, calculate_cart_totals};
use shared::util::{now_millis, snowflake_id};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use super::{coupons, products, variants};
use crate::core::ServiceResult;
use crate::utils::validation::MAX_QUANTITY;

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: i64,
    product_id: i64,
    variant_id: Option<i64>,
    quantity: i32,
    variation: Option<Json<VariationSnapshot>>,
    added_at: i64,
}

impl From<CartItemRow> for CartItem {
    fn from(r: CartItemRow) -> Self {
        Self {
            id: r.id,
            product_id: r.product_id,
            variant_id: r.variant_id,
            quantity: r.quantity,
            variation: r.variation.map(|j| j.0),
            added_at: r.added_at,
        }
    }
}

fn snapshot(variant: &ProductVariant) -> VariationSnapshot {
    VariationSnapshot {
        sku: variant.sku.clone(),
        price: variant.price,
        options: variant.options.clone(),
        image: variant.image.clone(),
    }
}

/// Whether a stored line can still be bought: the product is active and,
/// for variant lines, the variant is active and belongs to it. A plain line
/// on a product that has since gained variations is not purchasable.
fn line_available(product: &Product, variant_id: Option<i64>, variant: Option<&ProductVariant>) -> bool {
    if !product.is_active {
        return false;
    }
    match (variant_id, variant) {
        (Some(_), Some(v)) => v.is_active && v.product_id == product.id,
        (Some(_), None) => false,
        (None, _) => !product.has_variations,
    }
}

/// Quantity after adding `added` to an existing line, capped at [`MAX_QUANTITY`]
fn merged_quantity(current: i32, added: i32) -> Result<i32, AppError> {
    let quantity = current.saturating_add(added);
    if quantity > MAX_QUANTITY {
        return Err(AppError::invalid_field(
            "quantity",
            format!("quantity must be between 1 and {MAX_QUANTITY}, got {quantity}"),
        )
        .with_detail("in_cart", current));
    }
    Ok(quantity)
}

async fn ensure_cart(conn: &mut PgConnection, user_id: i64) -> ServiceResult<()> {
    sqlx::query(
        "INSERT INTO carts (user_id, coupon_code, updated_at) VALUES ($1, NULL, $2) \
         ON CONFLICT (user_id) DO UPDATE SET updated_at = EXCLUDED.updated_at",
    )
    .bind(user_id)
    .bind(now_millis())
    .execute(conn)
    .await?;
    Ok(())
}

async fn find_items(pool: &PgPool, user_id: i64) -> ServiceResult<Vec<CartItem>> {
    let rows = sqlx::query_as::<_, CartItemRow>(
        "SELECT id, product_id, variant_id, quantity, variation, added_at \
         FROM cart_items WHERE user_id = $1 ORDER BY added_at, id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Build the cart view: live prices, line totals and coupon discount.
///
/// Lines whose product or variant was removed or deactivated are left out of
/// the view and the totals; they stay stored until the user removes them.
/// A stored coupon that no longer applies contributes no discount but stays
/// on the cart.
pub async fn load_view(pool: &PgPool, user_id: i64) -> ServiceResult<CartView> {
    let now = now_millis();
    let items = find_items(pool, user_id).await?;

    let product_ids: Vec<i64> = items.iter().map(|i| i.product_id).collect();
    let variant_ids: Vec<i64> = items.iter().filter_map(|i| i.variant_id).collect();
    let product_map: HashMap<i64, Product> = products::find_by_ids(pool, &product_ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    let variant_map: HashMap<i64, ProductVariant> = variants::find_by_ids(pool, &variant_ids)
        .await?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();

    let mut lines = Vec::with_capacity(items.len());
    let mut views = Vec::with_capacity(items.len());
    for item in items {
        let Some(product) = product_map.get(&item.product_id) else {
            continue;
        };
        let variant = item.variant_id.and_then(|id| variant_map.get(&id));
        if !line_available(product, item.variant_id, variant) {
            tracing::debug!(user_id, product_id = item.product_id, "Cart line no longer available");
            continue;
        }
        let (price, sale_price, stock, image) = match variant {
            Some(v) => (
                v.price,
                None,
                v.stock,
                v.image.clone().or_else(|| product.images.first().cloned()),
            ),
            None => (
                product.price,
                product.active_sale_price(now),
                product.stock,
                product.images.first().cloned(),
            ),
        };
        let line = CartLine {
            price,
            sale_price,
            quantity: item.quantity,
        };
        lines.push(line);
        views.push(CartLineView {
            name: product.name.clone(),
            slug: product.slug.clone(),
            image,
            price,
            sale_price,
            stock,
            line_total: line.line_total(),
            item,
        });
    }

    let coupon_code: Option<(Option<String>,)> =
        sqlx::query_as("SELECT coupon_code FROM carts WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    let coupon_code = coupon_code.and_then(|(c,)| c);

    let subtotal = calculate_cart_totals(&lines, None).subtotal;
    let coupon = match coupon_code.as_deref() {
        Some(code) => coupons::find_by_code(pool, code)
            .await?
            .filter(|c| c.check_applicable(subtotal, now).is_ok()),
        None => None,
    };

    Ok(CartView {
        user_id,
        items: views,
        coupon_code,
        totals: calculate_cart_totals(&lines, coupon.as_ref()),
    })
}

/// Resolve the product (and variant) for a cart line and return the stock available
async fn resolve_line(
    pool: &PgPool,
    product_id: i64,
    variant_id: Option<i64>,
) -> ServiceResult<(Product, Option<ProductVariant>, i32)> {
    let product = products::find_by_id(pool, product_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound).with_detail("product_id", product_id))?;
    if !product.is_active {
        return Err(AppError::new(ErrorCode::ProductInactive)
            .with_detail("product_id", product_id)
            .into());
    }
    match variant_id {
        Some(vid) => {
            let mut conn = pool.acquire().await?;
            let variant = variants::find_by_id(&mut conn, product_id, vid)
                .await?
                .filter(|v| v.is_active)
                .ok_or_else(|| AppError::new(ErrorCode::VariantNotFound).with_detail("variant_id", vid))?;
            let stock = variant.stock;
            Ok((product, Some(variant), stock))
        }
        None if product.has_variations => Err(AppError::new(ErrorCode::VariantRequired)
            .with_detail("product_id", product_id)
            .into()),
        None => {
            let stock = product.stock;
            Ok((product, None, stock))
        }
    }
}

async fn find_line(
    conn: &mut PgConnection,
    user_id: i64,
    product_id: i64,
    variant_id: Option<i64>,
) -> ServiceResult<Option<(i64, i32)>> {
    let row: Option<(i64, i32)> = sqlx::query_as(
        "SELECT id, quantity FROM cart_items \
         WHERE user_id = $1 AND product_id = $2 AND COALESCE(variant_id, 0) = COALESCE($3, 0)",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(variant_id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

async fn write_line(
    conn: &mut PgConnection,
    user_id: i64,
    existing: Option<i64>,
    product_id: i64,
    variant: Option<&ProductVariant>,
    quantity: i32,
) -> ServiceResult<()> {
    match existing {
        Some(id) => {
            sqlx::query("UPDATE cart_items SET quantity = $2 WHERE id = $1")
                .bind(id)
                .bind(quantity)
                .execute(conn)
                .await?;
        }
        None => {
            sqlx::query(
                "INSERT INTO cart_items (id, user_id, product_id, variant_id, quantity, variation, added_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(snowflake_id())
            .bind(user_id)
            .bind(product_id)
            .bind(variant.map(|v| v.id))
            .bind(quantity)
            .bind(variant.map(|v| Json(snapshot(v))))
            .bind(now_millis())
            .execute(conn)
            .await?;
        }
    }
    Ok(())
}

/// Add a line, merging with an existing line for the same product/variant
pub async fn add_item(pool: &PgPool, user_id: i64, data: &CartItemAdd) -> ServiceResult<()> {
    let (product, variant, stock) = resolve_line(pool, data.product_id, data.variant_id).await?;

    let mut tx = pool.begin().await?;
    ensure_cart(&mut tx, user_id).await?;
    let existing = find_line(&mut tx, user_id, data.product_id, data.variant_id).await?;
    let quantity = merged_quantity(existing.map(|(_, q)| q).unwrap_or(0), data.quantity)?;
    if quantity > stock {
        return Err(AppError::insufficient_stock(&product.name, stock, quantity).into());
    }
    write_line(
        &mut tx,
        user_id,
        existing.map(|(id, _)| id),
        data.product_id,
        variant.as_ref(),
        quantity,
    )
    .await?;
    tx.commit().await?;
    Ok(())
}

/// Set the quantity of one line
pub async fn update_item(
    pool: &PgPool,
    user_id: i64,
    item_id: i64,
    quantity: i32,
) -> ServiceResult<()> {
    let line: Option<(i64, Option<i64>)> = sqlx::query_as(
        "SELECT product_id, variant_id FROM cart_items WHERE id = $1 AND user_id = $2",
    )
    .bind(item_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    let (product_id, variant_id) = line.ok_or_else(|| AppError::new(ErrorCode::CartItemNotFound))?;

    let (product, _, stock) = resolve_line(pool, product_id, variant_id).await?;
    if quantity > stock {
        return Err(AppError::insufficient_stock(&product.name, stock, quantity).into());
    }

    sqlx::query("UPDATE cart_items SET quantity = $3 WHERE id = $1 AND user_id = $2")
        .bind(item_id)
        .bind(user_id)
        .bind(quantity)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn remove_item(pool: &PgPool, user_id: i64, item_id: i64) -> ServiceResult<()> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
        .bind(item_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::new(ErrorCode::CartItemNotFound).into());
    }
    Ok(())
}

/// `DELETE /api/cart`: drop every line and the applied coupon
pub async fn empty(pool: &PgPool, user_id: i64) -> ServiceResult<()> {
    let mut conn = pool.acquire().await?;
    clear(&mut conn, user_id).await
}

/// Remove every line and the coupon
pub async fn clear(conn: &mut PgConnection, user_id: i64) -> ServiceResult<()> {
    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("UPDATE carts SET coupon_code = NULL, updated_at = $2 WHERE user_id = $1")
        .bind(user_id)
        .bind(now_millis())
        .execute(conn)
        .await?;
    Ok(())
}

/// Merge a guest cart: per line the larger quantity wins, capped at stock.
/// Lines for unknown, inactive or out-of-stock products are skipped.
pub async fn sync(pool: &PgPool, user_id: i64, items: &[CartItemAdd]) -> ServiceResult<usize> {
    let mut resolved = Vec::with_capacity(items.len());
    for item in items {
        match resolve_line(pool, item.product_id, item.variant_id).await {
            Ok((_, variant, stock)) if stock > 0 => resolved.push((item, variant, stock)),
            Ok(_) => {}
            Err(crate::core::ServiceError::App(e)) => {
                tracing::debug!(product_id = item.product_id, code = %e.code, "Skipping guest cart line");
            }
            Err(e) => return Err(e),
        }
    }

    let mut tx = pool.begin().await?;
    ensure_cart(&mut tx, user_id).await?;
    let mut merged = 0;
    for (item, variant, stock) in resolved {
        let existing = find_line(&mut tx, user_id, item.product_id, item.variant_id).await?;
        let current = existing.map(|(_, q)| q).unwrap_or(0);
        let quantity = current.max(item.quantity).min(stock).min(MAX_QUANTITY);
        if quantity == current {
            continue;
        }
        write_line(
            &mut tx,
            user_id,
            existing.map(|(id, _)| id),
            item.product_id,
            variant.as_ref(),
            quantity,
        )
        .await?;
        merged += 1;
    }
    tx.commit().await?;
    Ok(merged)
}

/// Attach a coupon after strict validation against the current subtotal
pub async fn apply_coupon(pool: &PgPool, user_id: i64, code: &str) -> ServiceResult<()> {
    let coupon = coupons::find_by_code(pool, code)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CouponNotFound))?;
    let view = load_view(pool, user_id).await?;
    coupon.check_applicable(view.totals.subtotal, now_millis())?;

    let mut tx = pool.begin().await?;
    ensure_cart(&mut tx, user_id).await?;
    sqlx::query("UPDATE carts SET coupon_code = $2, updated_at = $3 WHERE user_id = $1")
        .bind(user_id)
        .bind(&coupon.code)
        .bind(now_millis())
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

pub async fn remove_coupon(pool: &PgPool, user_id: i64) -> ServiceResult<()> {
    sqlx::query("UPDATE carts SET coupon_code = NULL, updated_at = $2 WHERE user_id = $1")
        .bind(user_id)
        .bind(now_millis())
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(is_active: bool, has_variations: bool) -> Product {
        Product {
            id: 1,
            name: "Tee".into(),
            slug: "tee".into(),
            description: None,
            sku: None,
            price: 20.0,
            compare_price: None,
            sale_price: None,
            cost_price: None,
            stock: 5,
            low_stock_threshold: 2,
            category_id: None,
            brand_id: None,
            images: vec![],
            is_featured: false,
            is_active,
            has_variations,
            flash_sale_price: None,
            flash_sale_start: None,
            flash_sale_end: None,
            rating: 0.0,
            num_reviews: 0,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn variant(product_id: i64, is_active: bool) -> ProductVariant {
        ProductVariant {
            id: 10,
            product_id,
            sku: "TEE-RED-L".into(),
            price: 22.0,
            compare_price: None,
            stock: 3,
            options: vec![],
            image: None,
            is_active,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_inactive_product_line_is_hidden() {
        assert!(line_available(&product(true, false), None, None));
        assert!(!line_available(&product(false, false), None, None));
        let v = variant(1, true);
        assert!(!line_available(&product(false, true), Some(10), Some(&v)));
    }

    #[test]
    fn test_variant_line_needs_live_variant() {
        let p = product(true, true);
        assert!(line_available(&p, Some(10), Some(&variant(1, true))));
        assert!(!line_available(&p, Some(10), Some(&variant(1, false))));
        assert!(!line_available(&p, Some(10), Some(&variant(2, true))));
        assert!(!line_available(&p, Some(10), None));
        // plain line on a product that now has variations
        assert!(!line_available(&p, None, None));
    }

    #[test]
    fn test_merged_quantity_respects_cap() {
        assert_eq!(merged_quantity(0, 3).unwrap(), 3);
        assert_eq!(merged_quantity(9000, 999).unwrap(), MAX_QUANTITY);

        let err = merged_quantity(9000, 1000).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.details.unwrap().get("field").unwrap(), "quantity");

        assert!(merged_quantity(i32::MAX, 1).is_err());
    }
}
