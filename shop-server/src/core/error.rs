//! Service-layer error type
//!
//! `ServiceError` bridges DB-layer errors (`sqlx::Error`) and the API-layer
//! error (`AppError`), so repository calls can use `?` inside handlers.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use super::BoxError;

/// PostgreSQL `unique_violation`
const PG_UNIQUE_VIOLATION: &str = "23505";

/// - `Db`: database/infrastructure errors (logged, mapped to InternalError)
/// - `App`: business-rule errors (passed through to the client)
#[derive(Debug)]
pub enum ServiceError {
    Db(BoxError),
    App(AppError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// True when the error is a unique-constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(PG_UNIQUE_VIOLATION))
}

/// Map a unique violation to the given business error, anything else to `Db`
pub fn unique_or(err: sqlx::Error, on_conflict: impl FnOnce() -> AppError) -> ServiceError {
    if is_unique_violation(&err) {
        ServiceError::App(on_conflict())
    } else {
        ServiceError::from(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_is_masked() {
        let err = ServiceError::from(sqlx::Error::RowNotFound);
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::InternalError);
        assert!(!app.message.contains("no rows"));
    }

    #[test]
    fn test_app_error_passes_through() {
        let err = ServiceError::from(AppError::new(ErrorCode::CouponExpired));
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::CouponExpired);
    }

    #[test]
    fn test_non_database_error_is_not_unique_violation() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        let mapped = unique_or(sqlx::Error::RowNotFound, || {
            AppError::new(ErrorCode::ProductSlugExists)
        });
        assert!(matches!(mapped, ServiceError::Db(_)));
    }
}
