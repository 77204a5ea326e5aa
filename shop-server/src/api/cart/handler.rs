//! Cart API Handlers
//!
//! Every mutation answers with the re-priced cart.

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{ApplyCoupon, CartItemAdd, CartItemUpdate, CartSync, CartView};

use crate::api::{ApiResult, ok};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::carts;
use crate::utils::validation::{MAX_SHORT_TEXT_LEN, validate_quantity, validate_required_text};
use crate::utils::{ApiResponse, AppError};

/// Guest carts larger than this are rejected
const MAX_SYNC_LINES: usize = 200;

async fn view(state: &ServerState, user: &CurrentUser) -> ApiResult<CartView> {
    ok(carts::load_view(&state.pool, user.id).await?)
}

/// GET /api/cart
pub async fn get_cart(State(state): State<ServerState>, user: CurrentUser) -> ApiResult<CartView> {
    view(&state, &user).await
}

/// DELETE /api/cart
pub async fn clear(State(state): State<ServerState>, user: CurrentUser) -> ApiResult<CartView> {
    carts::empty(&state.pool, user.id).await?;
    view(&state, &user).await
}

/// POST /api/cart/items - 同一商品/规格合并数量
pub async fn add_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CartItemAdd>,
) -> ApiResult<CartView> {
    validate_quantity(payload.quantity)?;
    carts::add_item(&state.pool, user.id, &payload).await?;
    view(&state, &user).await
}

/// PUT /api/cart/items/{item_id}
pub async fn update_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(item_id): Path<i64>,
    Json(payload): Json<CartItemUpdate>,
) -> ApiResult<CartView> {
    validate_quantity(payload.quantity)?;
    carts::update_item(&state.pool, user.id, item_id, payload.quantity).await?;
    view(&state, &user).await
}

/// DELETE /api/cart/items/{item_id}
pub async fn remove_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(item_id): Path<i64>,
) -> ApiResult<CartView> {
    carts::remove_item(&state.pool, user.id, item_id).await?;
    view(&state, &user).await
}

/// POST /api/cart/sync - 合并游客购物车
pub async fn sync(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CartSync>,
) -> ApiResult<CartView> {
    if payload.items.len() > MAX_SYNC_LINES {
        return Err(AppError::invalid_field(
            "items",
            format!("At most {MAX_SYNC_LINES} lines can be merged"),
        ));
    }
    for item in &payload.items {
        validate_quantity(item.quantity)?;
    }
    let merged = carts::sync(&state.pool, user.id, &payload.items).await?;
    let cart = carts::load_view(&state.pool, user.id).await?;
    Ok(Json(ApiResponse::success_with_message(
        format!("{merged} line(s) merged"),
        cart,
    )))
}

/// POST /api/cart/coupon
pub async fn apply_coupon(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<ApplyCoupon>,
) -> ApiResult<CartView> {
    validate_required_text(&payload.code, "code", MAX_SHORT_TEXT_LEN)?;
    carts::apply_coupon(&state.pool, user.id, &payload.code).await?;
    view(&state, &user).await
}

/// DELETE /api/cart/coupon
pub async fn remove_coupon(State(state): State<ServerState>, user: CurrentUser) -> ApiResult<CartView> {
    carts::remove_coupon(&state.pool, user.id).await?;
    view(&state, &user).await
}
