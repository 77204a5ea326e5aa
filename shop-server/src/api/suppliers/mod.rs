//! Supplier API 模块 (`manage_suppliers`)

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::permissions::MANAGE_SUPPLIERS;
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/suppliers", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .layer(middleware::from_fn(require_permission(MANAGE_SUPPLIERS)))
}
