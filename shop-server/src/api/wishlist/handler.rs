//! Wishlist API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{WishlistAdd, WishlistEntry, WishlistItem};

use crate::api::{ApiResult, ok, ok_with_message};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::wishlist;

/// GET /api/wishlist
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> ApiResult<Vec<WishlistItem>> {
    ok(wishlist::find_by_user(&state.pool, user.id).await?)
}

/// POST /api/wishlist
pub async fn add(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<WishlistAdd>,
) -> ApiResult<WishlistEntry> {
    ok(wishlist::add(&state.pool, user.id, payload.product_id).await?)
}

/// DELETE /api/wishlist/{product_id}
pub async fn remove(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(product_id): Path<i64>,
) -> ApiResult<()> {
    wishlist::remove(&state.pool, user.id, product_id).await?;
    ok_with_message("Removed from wishlist")
}
