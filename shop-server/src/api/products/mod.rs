//! Product API 模块
//!
//! 商品、规格 (variants) 与商品评价。读接口公开，写接口需要 `manage_products`；
//! 提交评价只需登录。

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::permissions::MANAGE_PRODUCTS;
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/products", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/search", get(handler::search))
        .route("/featured", get(handler::featured))
        .route("/{id}", get(handler::get_by_key))
        .route("/{id}/variants", get(handler::list_variants))
        .route(
            "/{id}/reviews",
            get(handler::list_reviews).post(handler::create_review),
        );

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route("/{id}/variants", post(handler::create_variant))
        .route(
            "/{id}/variants/{variant_id}",
            put(handler::update_variant).delete(handler::delete_variant),
        )
        .layer(middleware::from_fn(require_permission(MANAGE_PRODUCTS)));

    read_routes.merge(manage_routes)
}
