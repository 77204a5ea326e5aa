//! Review moderation API (`manage_reviews`)
//!
//! 商品下的评论读取与提交在 `/api/products/{id}/reviews`。

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, patch},
};

use crate::auth::permissions::MANAGE_REVIEWS;
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/reviews", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/{id}/status", patch(handler::update_status))
        .route("/{id}", delete(handler::delete))
        .layer(middleware::from_fn(require_permission(MANAGE_REVIEWS)))
}
