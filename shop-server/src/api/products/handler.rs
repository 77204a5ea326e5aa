//! Product API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::models::{
    Product, ProductCreate, ProductDetail, ProductQuery, ProductUpdate, ProductVariant, Review,
    ReviewCreate, VariantCreate, VariantUpdate,
};
use shared::response::{PageQuery, PaginatedResponse};

use crate::api::upload::remove_unreferenced;
use crate::api::{ApiResult, ok, ok_with_message};
use crate::auth::CurrentUser;
use crate::auth::permissions::MANAGE_PRODUCTS;
use crate::core::ServerState;
use crate::db::{products, reviews, variants};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_PRODUCT_IMAGES, MAX_SHORT_TEXT_LEN, MAX_URL_LEN,
    validate_amount, validate_optional_amount, validate_optional_text, validate_rating,
    validate_required_text, validate_slug, validate_stock, validate_window,
};
use crate::utils::{AppError, ErrorCode};

fn validate_images(images: &[String]) -> Result<(), AppError> {
    if images.len() > MAX_PRODUCT_IMAGES {
        return Err(AppError::invalid_field(
            "images",
            format!("At most {MAX_PRODUCT_IMAGES} images per product"),
        ));
    }
    for image in images {
        validate_required_text(image, "images", MAX_URL_LEN)?;
    }
    Ok(())
}

fn validate_variant_create(v: &VariantCreate) -> Result<(), AppError> {
    validate_required_text(&v.sku, "sku", MAX_SHORT_TEXT_LEN)?;
    validate_amount(v.price, "price")?;
    validate_optional_amount(v.compare_price, "compare_price")?;
    if let Some(stock) = v.stock {
        validate_stock(stock, "stock")?;
    }
    validate_optional_text(&v.image, "image", MAX_URL_LEN)?;
    Ok(())
}

fn validate_variant_update(v: &VariantUpdate) -> Result<(), AppError> {
    if let Some(sku) = &v.sku {
        validate_required_text(sku, "sku", MAX_SHORT_TEXT_LEN)?;
    }
    validate_optional_amount(v.price, "price")?;
    validate_optional_amount(v.compare_price, "compare_price")?;
    if let Some(stock) = v.stock {
        validate_stock(stock, "stock")?;
    }
    validate_optional_text(&v.image, "image", MAX_URL_LEN)?;
    Ok(())
}

fn validate_create(p: &ProductCreate) -> Result<(), AppError> {
    validate_required_text(&p.name, "name", MAX_NAME_LEN)?;
    if let Some(slug) = &p.slug {
        validate_slug(slug)?;
    }
    validate_optional_text(&p.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&p.sku, "sku", MAX_SHORT_TEXT_LEN)?;
    validate_amount(p.price, "price")?;
    validate_optional_amount(p.compare_price, "compare_price")?;
    validate_optional_amount(p.sale_price, "sale_price")?;
    validate_optional_amount(p.cost_price, "cost_price")?;
    validate_optional_amount(p.flash_sale_price, "flash_sale_price")?;
    validate_window(p.flash_sale_start, p.flash_sale_end)?;
    if let Some(stock) = p.stock {
        validate_stock(stock, "stock")?;
    }
    if let Some(threshold) = p.low_stock_threshold {
        validate_stock(threshold, "low_stock_threshold")?;
    }
    if let Some(images) = &p.images {
        validate_images(images)?;
    }
    for variant in p.variants.iter().flatten() {
        validate_variant_create(variant)?;
    }
    Ok(())
}

fn validate_update(p: &ProductUpdate) -> Result<(), AppError> {
    if let Some(name) = &p.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(slug) = &p.slug {
        validate_slug(slug)?;
    }
    validate_optional_text(&p.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&p.sku, "sku", MAX_SHORT_TEXT_LEN)?;
    validate_optional_amount(p.price, "price")?;
    validate_optional_amount(p.compare_price, "compare_price")?;
    validate_optional_amount(p.sale_price, "sale_price")?;
    validate_optional_amount(p.cost_price, "cost_price")?;
    validate_optional_amount(p.flash_sale_price, "flash_sale_price")?;
    validate_window(p.flash_sale_start, p.flash_sale_end)?;
    if let Some(stock) = p.stock {
        validate_stock(stock, "stock")?;
    }
    if let Some(threshold) = p.low_stock_threshold {
        validate_stock(threshold, "low_stock_threshold")?;
    }
    if let Some(images) = &p.images {
        validate_images(images)?;
    }
    Ok(())
}

fn can_manage(user: &Option<CurrentUser>) -> bool {
    user.as_ref().is_some_and(|u| u.has_permission(MANAGE_PRODUCTS))
}

/// GET /api/products - 商品列表 (筛选 + 排序 + 分页)
///
/// 具有 `manage_products` 的调用者同时看到已下架商品。
pub async fn list(
    State(state): State<ServerState>,
    user: Option<CurrentUser>,
    Query(query): Query<ProductQuery>,
    Query(page): Query<PageQuery>,
) -> ApiResult<PaginatedResponse<Product>> {
    let (items, total) = products::find_page(&state.pool, &query, &page, can_manage(&user)).await?;
    ok(PaginatedResponse::new(items, &page, total))
}

/// GET /api/products/search?q=
pub async fn search(
    State(state): State<ServerState>,
    Query(query): Query<ProductQuery>,
    Query(page): Query<PageQuery>,
) -> ApiResult<PaginatedResponse<Product>> {
    let term = query.q.as_deref().unwrap_or_default();
    validate_required_text(term, "q", MAX_NAME_LEN)?;
    let (items, total) = products::find_page(&state.pool, &query, &page, false).await?;
    ok(PaginatedResponse::new(items, &page, total))
}

/// GET /api/products/featured
pub async fn featured(
    State(state): State<ServerState>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Vec<Product>> {
    ok(products::find_featured(&state.pool, page.limit()).await?)
}

/// GET /api/products/{id} - id 或 slug
pub async fn get_by_key(
    State(state): State<ServerState>,
    user: Option<CurrentUser>,
    Path(key): Path<String>,
) -> ApiResult<ProductDetail> {
    let detail = products::find_detail(&state.pool, &key)
        .await?
        .filter(|d| d.product.is_active || can_manage(&user))
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;
    ok(detail)
}

/// POST /api/products
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ProductCreate>,
) -> ApiResult<ProductDetail> {
    validate_create(&payload)?;
    let detail = products::create(&state.pool, payload).await?;
    tracing::info!(product_id = detail.product.id, slug = %detail.product.slug, "Product created");
    ok(detail)
}

/// PUT /api/products/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdate>,
) -> ApiResult<Product> {
    validate_update(&payload)?;
    let before = products::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;
    let product = products::update(&state.pool, id, payload).await?;

    // 被替换掉的图片
    for image in before.images.iter().filter(|&i| !product.images.contains(i)) {
        remove_unreferenced(&state, image).await;
    }
    ok(product)
}

/// DELETE /api/products/{id} - 同时删除不再被引用的图片文件
pub async fn delete(State(state): State<ServerState>, Path(id): Path<i64>) -> ApiResult<()> {
    let variant_images: Vec<String> = variants::find_by_product(&state.pool, id)
        .await?
        .into_iter()
        .filter_map(|v| v.image)
        .collect();
    let product = products::delete(&state.pool, id).await?;

    for image in product.images.iter().chain(variant_images.iter()) {
        remove_unreferenced(&state, image).await;
    }
    tracing::info!(product_id = id, "Product deleted");
    ok_with_message("Product deleted")
}

/// GET /api/products/{id}/variants
pub async fn list_variants(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<ProductVariant>> {
    ok(variants::find_by_product(&state.pool, id).await?)
}

/// POST /api/products/{id}/variants
pub async fn create_variant(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<VariantCreate>,
) -> ApiResult<ProductVariant> {
    validate_variant_create(&payload)?;
    if products::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::new(ErrorCode::ProductNotFound));
    }
    ok(variants::create(&state.pool, id, &payload).await?)
}

/// PUT /api/products/{id}/variants/{variant_id}
pub async fn update_variant(
    State(state): State<ServerState>,
    Path((id, variant_id)): Path<(i64, i64)>,
    Json(payload): Json<VariantUpdate>,
) -> ApiResult<ProductVariant> {
    validate_variant_update(&payload)?;
    ok(variants::update(&state.pool, id, variant_id, &payload).await?)
}

/// DELETE /api/products/{id}/variants/{variant_id}
pub async fn delete_variant(
    State(state): State<ServerState>,
    Path((id, variant_id)): Path<(i64, i64)>,
) -> ApiResult<()> {
    variants::delete(&state.pool, id, variant_id).await?;
    ok_with_message("Variant deleted")
}

/// GET /api/products/{id}/reviews - 仅已审核通过的评价
pub async fn list_reviews(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Query(page): Query<PageQuery>,
) -> ApiResult<PaginatedResponse<Review>> {
    let (items, total) = reviews::find_approved(&state.pool, id, &page).await?;
    ok(PaginatedResponse::new(items, &page, total))
}

/// POST /api/products/{id}/reviews - 需要已送达且包含该商品的订单
pub async fn create_review(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<ReviewCreate>,
) -> ApiResult<Review> {
    validate_rating(payload.rating)?;
    validate_optional_text(&payload.comment, "comment", MAX_NOTE_LEN)?;
    let review = reviews::create(&state.pool, user.id, id, &payload).await?;
    tracing::info!(review_id = review.id, product_id = id, user_id = user.id, "Review submitted");
    ok(review)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_create() -> ProductCreate {
        serde_json::from_value(serde_json::json!({
            "name": "Linen Shirt",
            "price": 49.5,
        }))
        .unwrap()
    }

    #[test]
    fn test_validate_create_accepts_minimal_payload() {
        assert!(validate_create(&product_create()).is_ok());
    }

    #[test]
    fn test_validate_create_rejects_bad_fields() {
        let mut p = product_create();
        p.price = -1.0;
        assert!(validate_create(&p).is_err());

        let mut p = product_create();
        p.name = "  ".into();
        assert!(validate_create(&p).is_err());

        let mut p = product_create();
        p.images = Some(vec!["/uploads/a.png".into(); MAX_PRODUCT_IMAGES + 1]);
        let err = validate_create(&p).unwrap_err();
        assert_eq!(err.details.unwrap().get("field").unwrap(), "images");

        let mut p = product_create();
        p.flash_sale_start = Some(2_000);
        p.flash_sale_end = Some(1_000);
        assert!(validate_create(&p).is_err());
    }
}
