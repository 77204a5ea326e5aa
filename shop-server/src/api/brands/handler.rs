//! Brand API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{Brand, BrandCreate, BrandUpdate};

use crate::api::upload::remove_unreferenced;
use crate::api::{ApiResult, ok, ok_with_message};
use crate::auth::CurrentUser;
use crate::auth::permissions::MANAGE_BRANDS;
use crate::core::ServerState;
use crate::db::brands;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_URL_LEN, validate_optional_text, validate_required_text,
    validate_slug,
};
use crate::utils::{AppError, ErrorCode};

/// GET /api/brands
pub async fn list(
    State(state): State<ServerState>,
    user: Option<CurrentUser>,
) -> ApiResult<Vec<Brand>> {
    let include_inactive = user.is_some_and(|u| u.has_permission(MANAGE_BRANDS));
    ok(brands::find_all(&state.pool, include_inactive).await?)
}

/// GET /api/brands/{id} - id 或 slug
pub async fn get_by_key(State(state): State<ServerState>, Path(key): Path<String>) -> ApiResult<Brand> {
    let brand = brands::find_by_key(&state.pool, &key)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BrandNotFound))?;
    ok(brand)
}

/// POST /api/brands
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<BrandCreate>,
) -> ApiResult<Brand> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    if let Some(slug) = &payload.slug {
        validate_slug(slug)?;
    }
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&payload.logo, "logo", MAX_URL_LEN)?;
    let brand = brands::create(&state.pool, payload).await?;
    tracing::info!(brand_id = brand.id, slug = %brand.slug, "Brand created");
    ok(brand)
}

/// PUT /api/brands/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<BrandUpdate>,
) -> ApiResult<Brand> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(slug) = &payload.slug {
        validate_slug(slug)?;
    }
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&payload.logo, "logo", MAX_URL_LEN)?;
    ok(brands::update(&state.pool, id, payload).await?)
}

/// DELETE /api/brands/{id} - 有商品引用时返回 409
pub async fn delete(State(state): State<ServerState>, Path(id): Path<i64>) -> ApiResult<()> {
    let logo = brands::find_by_id(&state.pool, id).await?.and_then(|b| b.logo);
    brands::delete(&state.pool, id).await?;
    if let Some(logo) = logo {
        remove_unreferenced(&state, &logo).await;
    }
    ok_with_message("Brand deleted")
}
