//! Review moderation handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::models::{ModerationQuery, ModerationUpdate, Review};
use shared::response::{PageQuery, PaginatedResponse};

use crate::api::{ApiResult, ok, ok_with_message};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::reviews;

/// GET /api/reviews?status=pending
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ModerationQuery>,
    Query(page): Query<PageQuery>,
) -> ApiResult<PaginatedResponse<Review>> {
    let (items, total) = reviews::find_page(&state.pool, query.status, &page).await?;
    ok(PaginatedResponse::new(items, &page, total))
}

/// PATCH /api/reviews/{id}/status - 状态变化后重算商品评分
pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<ModerationUpdate>,
) -> ApiResult<Review> {
    let review = reviews::set_status(&state.pool, id, payload.status).await?;
    tracing::info!(
        review_id = id,
        status = payload.status.as_str(),
        moderator = user.id,
        "Review moderated"
    );
    ok(review)
}

/// DELETE /api/reviews/{id}
pub async fn delete(State(state): State<ServerState>, Path(id): Path<i64>) -> ApiResult<()> {
    reviews::delete(&state.pool, id).await?;
    ok_with_message("Review deleted")
}
