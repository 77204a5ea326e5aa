//! POS sale API 模块 (`manage_sales`)

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::permissions::MANAGE_SALES;
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/sales", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", get(handler::get_by_id))
        .layer(middleware::from_fn(require_permission(MANAGE_SALES)))
}
