//! Supplier API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{Supplier, SupplierCreate, SupplierUpdate};
use shared::response::{PageQuery, PaginatedResponse};

use crate::api::{ApiResult, ok, ok_with_message};
use crate::core::ServerState;
use crate::db::suppliers;
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_email, validate_optional_text,
    validate_required_text,
};
use crate::utils::{AppError, ErrorCode};

#[derive(Debug, Deserialize)]
pub struct SupplierSearch {
    pub q: Option<String>,
}

fn validate_contact(
    contact_person: &Option<String>,
    email: &Option<String>,
    phone: &Option<String>,
    address: &Option<String>,
) -> Result<(), AppError> {
    validate_optional_text(contact_person, "contact_person", MAX_NAME_LEN)?;
    if let Some(email) = email.as_deref()
        && !email.trim().is_empty()
    {
        validate_email(email.trim())?;
    }
    validate_optional_text(phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(address, "address", MAX_ADDRESS_LEN)?;
    Ok(())
}

/// GET /api/suppliers?q=&page=&limit=
pub async fn list(
    State(state): State<ServerState>,
    Query(search): Query<SupplierSearch>,
    Query(page): Query<PageQuery>,
) -> ApiResult<PaginatedResponse<Supplier>> {
    let (items, total) = suppliers::find_page(&state.pool, search.q.as_deref(), &page).await?;
    ok(PaginatedResponse::new(items, &page, total))
}

/// GET /api/suppliers/{id}
pub async fn get_by_id(State(state): State<ServerState>, Path(id): Path<i64>) -> ApiResult<Supplier> {
    let supplier = suppliers::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::SupplierNotFound))?;
    ok(supplier)
}

/// POST /api/suppliers
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<SupplierCreate>,
) -> ApiResult<Supplier> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_contact(
        &payload.contact_person,
        &payload.email,
        &payload.phone,
        &payload.address,
    )?;
    ok(suppliers::create(&state.pool, payload).await?)
}

/// PUT /api/suppliers/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<SupplierUpdate>,
) -> ApiResult<Supplier> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_contact(
        &payload.contact_person,
        &payload.email,
        &payload.phone,
        &payload.address,
    )?;
    ok(suppliers::update(&state.pool, id, payload).await?)
}

/// DELETE /api/suppliers/{id} - 有采购记录时拒绝
pub async fn delete(State(state): State<ServerState>, Path(id): Path<i64>) -> ApiResult<()> {
    suppliers::delete(&state.pool, id).await?;
    ok_with_message("Supplier deleted")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_contact() {
        assert!(validate_contact(&None, &None, &None, &None).is_ok());
        // 空邮箱视为未填写
        assert!(validate_contact(&None, &Some(" ".into()), &None, &None).is_ok());
        assert!(validate_contact(&None, &Some("sales@acme.test".into()), &None, &None).is_ok());

        let err = validate_contact(&None, &Some("not-an-email".into()), &None, &None).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
