//! Upload Routes
//!
//! `POST /api/upload` stores a validated image under the upload directory;
//! the files themselves are served by `ServeDir` at `/uploads/*`.

mod handler;

use axum::{Router, extract::DefaultBodyLimit, middleware, routing::post};

use crate::auth::permissions::{MANAGE_BRANDS, MANAGE_CATEGORIES, MANAGE_PRODUCTS, MANAGE_SETTINGS};
use crate::auth::require_any_permission;
use crate::core::ServerState;

pub(crate) use handler::remove_unreferenced;

/// Multipart body ceiling; the configured per-file limit is checked in the handler
const MAX_MULTIPART_BYTES: usize = 20 * 1024 * 1024;

const UPLOAD_PERMISSIONS: &[&str] = &[MANAGE_PRODUCTS, MANAGE_CATEGORIES, MANAGE_BRANDS, MANAGE_SETTINGS];

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/upload", post(handler::upload))
        .layer(DefaultBodyLimit::max(MAX_MULTIPART_BYTES))
        .layer(middleware::from_fn(require_any_permission(UPLOAD_PERMISSIONS)))
}
