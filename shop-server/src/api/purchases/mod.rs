//! Purchase API 模块 (`manage_purchases`)
//!
//! 采购入库：创建时增加库存，之后只允许追加付款。

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::permissions::MANAGE_PURCHASES;
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/purchases", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/payments", post(handler::add_payment))
        .layer(middleware::from_fn(require_permission(MANAGE_PURCHASES)))
}
