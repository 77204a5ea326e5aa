//! POS sale handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::models::{Sale, SaleCreate};
use shared::response::{PageQuery, PaginatedResponse};

use crate::api::{ApiResult, ok};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::{sales, site_settings};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_amount, validate_optional_amount,
    validate_optional_text, validate_quantity, validate_tax_rate,
};
use crate::utils::{AppError, ErrorCode};

fn validate_create(payload: &SaleCreate) -> Result<(), AppError> {
    if payload.items.is_empty() {
        return Err(AppError::invalid_field("items", "A sale needs at least one item"));
    }
    for item in &payload.items {
        validate_quantity(item.quantity)?;
        validate_optional_amount(item.unit_price, "unit_price")?;
    }
    validate_optional_amount(payload.discount, "discount")?;
    if let Some(rate) = payload.tax_rate {
        validate_tax_rate(rate)?;
    }
    validate_amount(payload.paid_amount, "paid_amount")?;
    validate_optional_text(&payload.customer_name, "customer_name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.customer_phone, "customer_phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.note, "note", MAX_NOTE_LEN)?;
    Ok(())
}

/// GET /api/sales
pub async fn list(
    State(state): State<ServerState>,
    Query(page): Query<PageQuery>,
) -> ApiResult<PaginatedResponse<Sale>> {
    let (items, total) = sales::find_page(&state.pool, &page).await?;
    ok(PaginatedResponse::new(items, &page, total))
}

/// GET /api/sales/{id}
pub async fn get_by_id(State(state): State<ServerState>, Path(id): Path<i64>) -> ApiResult<Sale> {
    let sale = sales::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::SaleNotFound))?;
    ok(sale)
}

/// POST /api/sales - 未指定税率时使用站点设置
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<SaleCreate>,
) -> ApiResult<Sale> {
    validate_create(&payload)?;
    let settings = site_settings::get(&state.pool).await?;
    ok(sales::create(&state.pool, user.id, &payload, settings.tax_rate).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{PaymentMethod, SaleItemInput};

    fn payload() -> SaleCreate {
        SaleCreate {
            customer_name: Some("Walk-in".into()),
            customer_phone: None,
            items: vec![SaleItemInput {
                product_id: 7,
                variant_id: None,
                quantity: 2,
                unit_price: None,
            }],
            discount: None,
            tax_rate: Some(0.0),
            paid_amount: 20.0,
            payment_method: PaymentMethod::Cash,
            note: None,
        }
    }

    #[test]
    fn test_validate_create() {
        assert!(validate_create(&payload()).is_ok());

        let mut p = payload();
        p.tax_rate = Some(150.0);
        assert!(validate_create(&p).is_err());

        let mut p = payload();
        p.items[0].quantity = 0;
        assert!(validate_create(&p).is_err());

        let mut p = payload();
        p.items.clear();
        assert!(validate_create(&p).is_err());
    }
}
