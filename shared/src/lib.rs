//! Shared types for the storefront backend
//!
//! Domain models, pure pricing calculators, the unified error system and
//! the API response envelope used by `shop-server` and its clients.

pub mod error;
pub mod models;
pub mod pricing;
pub mod response;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use response::{PageQuery, PaginatedResponse, Pagination};
