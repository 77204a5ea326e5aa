//! Coupon API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::models::{Coupon, CouponCreate, CouponType, CouponUpdate};
use shared::response::{PageQuery, PaginatedResponse};

use crate::api::{ApiResult, ok, ok_with_message};
use crate::core::ServerState;
use crate::db::coupons;
use crate::utils::validation::{
    MAX_SHORT_TEXT_LEN, validate_amount, validate_optional_amount, validate_percentage,
    validate_required_text,
};
use crate::utils::{AppError, ErrorCode};

fn validate_value(coupon_type: CouponType, value: f64) -> Result<(), AppError> {
    match coupon_type {
        CouponType::Percentage => validate_percentage(value, "value"),
        CouponType::Fixed => validate_amount(value, "value"),
    }
}

/// GET /api/coupons
pub async fn list(
    State(state): State<ServerState>,
    Query(page): Query<PageQuery>,
) -> ApiResult<PaginatedResponse<Coupon>> {
    let (items, total) = coupons::find_page(&state.pool, &page).await?;
    ok(PaginatedResponse::new(items, &page, total))
}

/// POST /api/coupons - code 统一转为大写
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CouponCreate>,
) -> ApiResult<Coupon> {
    validate_required_text(&payload.code, "code", MAX_SHORT_TEXT_LEN)?;
    validate_value(payload.coupon_type, payload.value)?;
    validate_optional_amount(payload.min_purchase, "min_purchase")?;

    let coupon = coupons::create(&state.pool, payload).await?;
    tracing::info!(coupon_id = coupon.id, code = %coupon.code, "Coupon created");
    ok(coupon)
}

/// PUT /api/coupons/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CouponUpdate>,
) -> ApiResult<Coupon> {
    if let Some(code) = &payload.code {
        validate_required_text(code, "code", MAX_SHORT_TEXT_LEN)?;
    }
    validate_optional_amount(payload.min_purchase, "min_purchase")?;

    if payload.coupon_type.is_some() || payload.value.is_some() {
        let current = coupons::find_by_id(&state.pool, id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::CouponNotFound))?;
        validate_value(
            payload.coupon_type.unwrap_or(current.coupon_type),
            payload.value.unwrap_or(current.value),
        )?;
    }

    ok(coupons::update(&state.pool, id, payload).await?)
}

/// DELETE /api/coupons/{id}
pub async fn delete(State(state): State<ServerState>, Path(id): Path<i64>) -> ApiResult<()> {
    coupons::delete(&state.pool, id).await?;
    ok_with_message("Coupon deleted")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_value_by_type() {
        assert!(validate_value(CouponType::Percentage, 15.0).is_ok());
        assert!(validate_value(CouponType::Percentage, 100.0).is_ok());
        assert!(validate_value(CouponType::Percentage, 0.0).is_err());
        assert!(validate_value(CouponType::Percentage, 150.0).is_err());
        assert!(validate_value(CouponType::Fixed, 150.0).is_ok());
        assert!(validate_value(CouponType::Fixed, -5.0).is_err());
    }
}
