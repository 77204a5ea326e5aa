//! Category API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{Category, CategoryCreate, CategoryNode, CategoryUpdate};

use crate::api::upload::remove_unreferenced;
use crate::api::{ApiResult, ok, ok_with_message};
use crate::auth::CurrentUser;
use crate::auth::permissions::MANAGE_CATEGORIES;
use crate::core::ServerState;
use crate::db::categories;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_URL_LEN, validate_optional_text, validate_required_text,
    validate_slug,
};
use crate::utils::{AppError, ErrorCode};

fn include_inactive(user: &Option<CurrentUser>) -> bool {
    user.as_ref().is_some_and(|u| u.has_permission(MANAGE_CATEGORIES))
}

/// GET /api/categories - 扁平列表 (含 parent_id)
pub async fn list(
    State(state): State<ServerState>,
    user: Option<CurrentUser>,
) -> ApiResult<Vec<Category>> {
    ok(categories::find_all(&state.pool, include_inactive(&user)).await?)
}

/// GET /api/categories/tree
pub async fn tree(
    State(state): State<ServerState>,
    user: Option<CurrentUser>,
) -> ApiResult<Vec<CategoryNode>> {
    let all = categories::find_all(&state.pool, include_inactive(&user)).await?;
    ok(CategoryNode::build_tree(all))
}

/// GET /api/categories/{id} - id 或 slug
pub async fn get_by_key(
    State(state): State<ServerState>,
    Path(key): Path<String>,
) -> ApiResult<Category> {
    let category = categories::find_by_key(&state.pool, &key)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CategoryNotFound))?;
    ok(category)
}

/// POST /api/categories
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CategoryCreate>,
) -> ApiResult<Category> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    if let Some(slug) = &payload.slug {
        validate_slug(slug)?;
    }
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&payload.image, "image", MAX_URL_LEN)?;

    let category = categories::create(&state.pool, payload).await?;
    tracing::info!(category_id = category.id, slug = %category.slug, "Category created");
    ok(category)
}

/// PUT /api/categories/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryUpdate>,
) -> ApiResult<Category> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(slug) = &payload.slug {
        validate_slug(slug)?;
    }
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&payload.image, "image", MAX_URL_LEN)?;

    ok(categories::update(&state.pool, id, payload).await?)
}

/// DELETE /api/categories/{id} - 有商品或子分类时返回 409
pub async fn delete(State(state): State<ServerState>, Path(id): Path<i64>) -> ApiResult<()> {
    let image = categories::find_by_id(&state.pool, id)
        .await?
        .and_then(|c| c.image);
    categories::delete(&state.pool, id).await?;
    if let Some(image) = image {
        remove_unreferenced(&state, &image).await;
    }
    ok_with_message("Category deleted")
}
