//! Order API 模块
//!
//! 下单与查看自己的订单只需登录；订单列表需要 `view_orders`，
//! 状态与付款变更需要 `manage_orders`。

mod handler;

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use crate::auth::permissions::{MANAGE_ORDERS, VIEW_ORDERS};
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    let customer_routes = Router::new()
        .route("/", post(handler::create))
        .route("/my-orders", get(handler::my_orders))
        // 所有者或 view_orders，在 handler 中检查
        .route("/{id}", get(handler::get_by_id));

    let view_routes = Router::new()
        .route("/", get(handler::list))
        .layer(middleware::from_fn(require_permission(VIEW_ORDERS)));

    let manage_routes = Router::new()
        .route("/{id}/status", patch(handler::update_status))
        .route("/{id}/payments", post(handler::add_payment))
        .route(
            "/{id}/payments/{payment_id}",
            patch(handler::update_payment_status),
        )
        .layer(middleware::from_fn(require_permission(MANAGE_ORDERS)));

    customer_routes.merge(view_routes).merge(manage_routes)
}
