//! Site settings API 模块
//!
//! GET 公开，PUT 需要 `manage_settings`。

mod handler;

use axum::{
    Router, middleware,
    routing::{get, put},
};

use crate::auth::permissions::MANAGE_SETTINGS;
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/site-settings", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new().route("/", get(handler::get));

    let manage_routes = Router::new()
        .route("/", put(handler::update))
        .layer(middleware::from_fn(require_permission(MANAGE_SETTINGS)));

    read_routes.merge(manage_routes)
}
