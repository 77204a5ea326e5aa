//! Testimonial API 模块
//!
//! 公开列表只返回已审核的内容；提交需要登录，审核需要 `manage_reviews`。

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, patch},
};

use crate::auth::permissions::MANAGE_REVIEWS;
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/testimonials", routes())
}

fn routes() -> Router<ServerState> {
    let public_routes = Router::new().route("/", get(handler::list).post(handler::create));

    let manage_routes = Router::new()
        .route("/all", get(handler::list_all))
        .route("/{id}/status", patch(handler::update_status))
        .route("/{id}", delete(handler::delete))
        .layer(middleware::from_fn(require_permission(MANAGE_REVIEWS)));

    public_routes.merge(manage_routes)
}
