//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::models::{
    Order, OrderCreate, OrderQuery, OrderStatusUpdate, PaymentCreate, PaymentStatusUpdate,
    ShippingAddress,
};
use shared::response::{PageQuery, PaginatedResponse};

use crate::api::{ApiResult, ok};
use crate::auth::CurrentUser;
use crate::auth::permissions::VIEW_ORDERS;
use crate::core::ServerState;
use crate::db::{orders, site_settings};
use crate::security_log;
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text,
    validate_positive_amount, validate_quantity, validate_required_text,
};
use crate::utils::{AppError, ErrorCode};

/// Lines per order
const MAX_ORDER_LINES: usize = 100;

fn validate_address(address: &ShippingAddress) -> Result<(), AppError> {
    validate_required_text(&address.full_name, "shipping_address.full_name", MAX_NAME_LEN)?;
    validate_required_text(&address.phone, "shipping_address.phone", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(
        &address.address_line,
        "shipping_address.address_line",
        MAX_ADDRESS_LEN,
    )?;
    validate_required_text(&address.city, "shipping_address.city", MAX_NAME_LEN)?;
    validate_optional_text(&address.state, "shipping_address.state", MAX_NAME_LEN)?;
    validate_optional_text(
        &address.postal_code,
        "shipping_address.postal_code",
        MAX_SHORT_TEXT_LEN,
    )?;
    validate_optional_text(&address.country, "shipping_address.country", MAX_NAME_LEN)?;
    Ok(())
}

fn validate_order(payload: &OrderCreate) -> Result<(), AppError> {
    if payload.items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }
    if payload.items.len() > MAX_ORDER_LINES {
        return Err(AppError::invalid_field(
            "items",
            format!("At most {MAX_ORDER_LINES} lines per order"),
        ));
    }
    for item in &payload.items {
        validate_quantity(item.quantity)?;
    }
    validate_address(&payload.shipping_address)?;
    validate_optional_text(&payload.coupon_code, "coupon_code", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.note, "note", MAX_NOTE_LEN)?;
    Ok(())
}

/// POST /api/orders - 下单，成功后清空购物车
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<OrderCreate>,
) -> ApiResult<Order> {
    validate_order(&payload)?;
    let settings = site_settings::get(&state.pool).await?;
    ok(orders::create(&state.pool, user.id, &payload, &settings).await?)
}

/// GET /api/orders - 后台订单列表
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<OrderQuery>,
    Query(page): Query<PageQuery>,
) -> ApiResult<PaginatedResponse<Order>> {
    let (items, total) = orders::find_page(&state.pool, &query, &page).await?;
    ok(PaginatedResponse::new(items, &page, total))
}

/// GET /api/orders/my-orders
pub async fn my_orders(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(page): Query<PageQuery>,
) -> ApiResult<PaginatedResponse<Order>> {
    let (items, total) = orders::find_by_user(&state.pool, user.id, &page).await?;
    ok(PaginatedResponse::new(items, &page, total))
}

/// GET /api/orders/{id} - 所有者或 view_orders
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Order> {
    let order = orders::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    if order.user_id != user.id && !user.has_permission(VIEW_ORDERS) {
        security_log!("WARN", "order_access_denied", user_id = user.id, order_id = id);
        // 不暴露订单是否存在
        return Err(AppError::new(ErrorCode::OrderNotFound));
    }
    ok(order)
}

/// PATCH /api/orders/{id}/status - 取消时回补库存
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<OrderStatusUpdate>,
) -> ApiResult<Order> {
    ok(orders::update_status(&state.pool, id, payload.status).await?)
}

/// POST /api/orders/{id}/payments
pub async fn add_payment(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<PaymentCreate>,
) -> ApiResult<Order> {
    validate_positive_amount(payload.amount, "amount")?;
    validate_required_text(&payload.method, "method", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.transaction_id, "transaction_id", MAX_NAME_LEN)?;
    validate_optional_text(&payload.note, "note", MAX_NOTE_LEN)?;
    ok(orders::add_payment(&state.pool, id, &payload).await?)
}

/// PATCH /api/orders/{id}/payments/{payment_id}
pub async fn update_payment_status(
    State(state): State<ServerState>,
    Path((id, payment_id)): Path<(i64, i64)>,
    Json(payload): Json<PaymentStatusUpdate>,
) -> ApiResult<Order> {
    ok(orders::update_payment_status(&state.pool, id, payment_id, payload.status).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> OrderCreate {
        serde_json::from_value(serde_json::json!({
            "items": [{"product_id": 1, "quantity": 2}],
            "shipping_address": {
                "full_name": "Ada Lovelace",
                "phone": "+44 20 0000 0000",
                "address_line": "12 St James's Square",
                "city": "London"
            },
            "payment_method": "cash_on_delivery"
        }))
        .unwrap()
    }

    #[test]
    fn test_validate_order_accepts_valid_payload() {
        assert!(validate_order(&order()).is_ok());
    }

    #[test]
    fn test_validate_order_rejects_empty_and_bad_lines() {
        let mut o = order();
        o.items.clear();
        assert_eq!(validate_order(&o).unwrap_err().code, ErrorCode::OrderEmpty);

        let mut o = order();
        o.items[0].quantity = 0;
        assert_eq!(validate_order(&o).unwrap_err().code, ErrorCode::ValidationFailed);

        let mut o = order();
        o.shipping_address.city = String::new();
        let err = validate_order(&o).unwrap_err();
        assert_eq!(
            err.details.unwrap().get("field").unwrap(),
            "shipping_address.city"
        );
    }
}
