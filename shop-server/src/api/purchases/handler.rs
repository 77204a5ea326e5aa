//! Purchase API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::models::{Purchase, PurchaseCreate, PurchasePayment};
use shared::response::{PageQuery, PaginatedResponse};

use crate::api::{ApiResult, ok};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::purchases;
use crate::utils::validation::{
    MAX_NOTE_LEN, validate_amount, validate_optional_amount, validate_optional_text,
    validate_positive_amount, validate_quantity,
};
use crate::utils::{AppError, ErrorCode};

fn validate_create(payload: &PurchaseCreate) -> Result<(), AppError> {
    if payload.items.is_empty() {
        return Err(AppError::invalid_field(
            "items",
            "A purchase needs at least one item",
        ));
    }
    for item in &payload.items {
        validate_quantity(item.quantity)?;
        validate_amount(item.unit_cost, "unit_cost")?;
    }
    validate_optional_amount(payload.shipping_cost, "shipping_cost")?;
    validate_optional_amount(payload.discount, "discount")?;
    validate_optional_amount(payload.paid_amount, "paid_amount")?;
    validate_optional_text(&payload.note, "note", MAX_NOTE_LEN)?;
    Ok(())
}

/// GET /api/purchases
pub async fn list(
    State(state): State<ServerState>,
    Query(page): Query<PageQuery>,
) -> ApiResult<PaginatedResponse<Purchase>> {
    let (items, total) = purchases::find_page(&state.pool, &page).await?;
    ok(PaginatedResponse::new(items, &page, total))
}

/// GET /api/purchases/{id}
pub async fn get_by_id(State(state): State<ServerState>, Path(id): Path<i64>) -> ApiResult<Purchase> {
    let purchase = purchases::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PurchaseNotFound))?;
    ok(purchase)
}

/// POST /api/purchases - 入库并记录应付
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<PurchaseCreate>,
) -> ApiResult<Purchase> {
    validate_create(&payload)?;
    ok(purchases::create(&state.pool, user.id, &payload).await?)
}

/// POST /api/purchases/{id}/payments
pub async fn add_payment(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<PurchasePayment>,
) -> ApiResult<Purchase> {
    validate_positive_amount(payload.amount, "amount")?;
    ok(purchases::add_payment(&state.pool, id, payload.amount).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::PurchaseItemInput;

    fn payload() -> PurchaseCreate {
        PurchaseCreate {
            supplier_id: 1,
            items: vec![PurchaseItemInput {
                product_id: 10,
                variant_id: None,
                quantity: 24,
                unit_cost: 3.5,
            }],
            shipping_cost: Some(5.0),
            discount: None,
            paid_amount: Some(50.0),
            note: None,
            purchased_at: None,
        }
    }

    #[test]
    fn test_validate_create() {
        assert!(validate_create(&payload()).is_ok());

        let mut p = payload();
        p.items.clear();
        assert!(validate_create(&p).is_err());

        let mut p = payload();
        p.items[0].unit_cost = -1.0;
        assert!(validate_create(&p).is_err());

        let mut p = payload();
        p.shipping_cost = Some(f64::NAN);
        assert!(validate_create(&p).is_err());
    }
}
