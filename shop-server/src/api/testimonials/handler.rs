//! Testimonial API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::models::{
    ModerationQuery, ModerationStatus, ModerationUpdate, Testimonial, TestimonialCreate,
};

use crate::api::{ApiResult, ok, ok_with_message};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::{testimonials, users};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_URL_LEN, validate_optional_text, validate_rating,
    validate_required_text,
};
use crate::utils::{AppError, ErrorCode};

fn validate_create(payload: &TestimonialCreate) -> Result<(), AppError> {
    validate_optional_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.designation, "designation", MAX_NAME_LEN)?;
    validate_required_text(&payload.content, "content", MAX_NOTE_LEN)?;
    validate_optional_text(&payload.avatar, "avatar", MAX_URL_LEN)?;
    validate_rating(payload.rating)?;
    Ok(())
}

/// GET /api/testimonials - 已审核
pub async fn list(State(state): State<ServerState>) -> ApiResult<Vec<Testimonial>> {
    ok(testimonials::find_all(&state.pool, Some(ModerationStatus::Approved)).await?)
}

/// GET /api/testimonials/all?status=
pub async fn list_all(
    State(state): State<ServerState>,
    Query(query): Query<ModerationQuery>,
) -> ApiResult<Vec<Testimonial>> {
    ok(testimonials::find_all(&state.pool, query.status).await?)
}

/// POST /api/testimonials - 进入待审核队列
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<TestimonialCreate>,
) -> ApiResult<Testimonial> {
    validate_create(&payload)?;

    let name = match payload.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            users::find_by_id(&state.pool, user.id)
                .await?
                .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?
                .name
        }
    };

    ok(testimonials::create(&state.pool, user.id, &name, &payload).await?)
}

/// PATCH /api/testimonials/{id}/status
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ModerationUpdate>,
) -> ApiResult<Testimonial> {
    ok(testimonials::set_status(&state.pool, id, payload.status).await?)
}

/// DELETE /api/testimonials/{id}
pub async fn delete(State(state): State<ServerState>, Path(id): Path<i64>) -> ApiResult<()> {
    testimonials::delete(&state.pool, id).await?;
    ok_with_message("Testimonial deleted")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> TestimonialCreate {
        TestimonialCreate {
            name: None,
            designation: Some("Regular customer".into()),
            content: "Fast delivery and great packaging".into(),
            rating: 5,
            avatar: None,
        }
    }

    #[test]
    fn test_validate_create() {
        assert!(validate_create(&payload()).is_ok());

        let mut p = payload();
        p.rating = 6;
        assert!(validate_create(&p).is_err());

        let mut p = payload();
        p.content = "   ".into();
        assert!(validate_create(&p).is_err());
    }
}
