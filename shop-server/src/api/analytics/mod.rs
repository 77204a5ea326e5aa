//! Analytics API 模块 (`view_analytics`)

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::permissions::VIEW_ANALYTICS;
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/analytics", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/dashboard", get(handler::dashboard))
        .route("/sales-report", get(handler::sales_report))
        .route("/top-customers", get(handler::top_customers))
        .layer(middleware::from_fn(require_permission(VIEW_ANALYTICS)))
}
