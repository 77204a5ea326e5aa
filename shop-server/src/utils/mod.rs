//! 工具模块 - 通用工具函数和类型
//!
//! - [`AppError`] / [`ApiResponse`] - 统一错误与响应 (from shared::error)
//! - [`validation`] - 输入校验
//! - [`logger`] - 日志初始化
//! - [`password`] - Argon2 密码哈希

pub mod logger;
pub mod password;
pub mod validation;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

use axum::Json;

/// Handler result: the `ApiResponse` envelope or an `AppError`
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// Wrap data in a success envelope
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

/// Success envelope with a custom message and no data
pub fn ok_with_message(message: impl Into<String>) -> ApiResult<()> {
    Ok(Json(ApiResponse::ok_with_message(message)))
}
