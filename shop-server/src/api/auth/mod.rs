//! Authentication Routes

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

/// - /api/auth/login, /api/auth/register: public
/// - /api/auth/me, /api/auth/profile, /api/auth/password: 需要登录 (global require_auth)
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/auth/register", post(handler::register))
        .route("/api/auth/login", post(handler::login))
        .route("/api/auth/me", get(handler::me))
        .route("/api/auth/profile", put(handler::update_profile))
        .route("/api/auth/password", put(handler::change_password))
}
