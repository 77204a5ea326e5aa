//! Testimonial database operations

use shared::error::{AppError, ErrorCode};
use shared::models::{ModerationStatus, Testimonial, TestimonialCreate};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use crate::core::ServiceResult;

const COLUMNS: &str = "id, user_id, name, designation, content, rating, avatar, status, created_at";

#[derive(sqlx::FromRow)]
struct TestimonialRow {
    id: i64,
    user_id: Option<i64>,
    name: String,
    designation: Option<String>,
    content: String,
    rating: i32,
    avatar: Option<String>,
    status: String,
    created_at: i64,
}

impl From<TestimonialRow> for Testimonial {
    fn from(r: TestimonialRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            name: r.name,
            designation: r.designation,
            content: r.content,
            rating: r.rating,
            avatar: r.avatar,
            status: ModerationStatus::from_db(&r.status),
            created_at: r.created_at,
        }
    }
}

/// Testimonials, optionally restricted to one moderation status
pub async fn find_all(
    pool: &PgPool,
    status: Option<ModerationStatus>,
) -> ServiceResult<Vec<Testimonial>> {
    let rows = sqlx::query_as::<_, TestimonialRow>(&format!(
        "SELECT {COLUMNS} FROM testimonials WHERE ($1::text IS NULL OR status = $1) \
         ORDER BY created_at DESC"
    ))
    .bind(status.map(|s| s.as_str()))
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// `name` is the display name to publish (defaults to the author's account name)
pub async fn create(
    pool: &PgPool,
    user_id: i64,
    name: &str,
    data: &TestimonialCreate,
) -> ServiceResult<Testimonial> {
    let row = sqlx::query_as::<_, TestimonialRow>(&format!(
        "INSERT INTO testimonials (id, user_id, name, designation, content, rating, avatar, status, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(user_id)
    .bind(name)
    .bind(&data.designation)
    .bind(data.content.trim())
    .bind(data.rating)
    .bind(&data.avatar)
    .bind(ModerationStatus::Pending.as_str())
    .bind(now_millis())
    .fetch_one(pool)
    .await?;
    Ok(row.into())
}

pub async fn set_status(
    pool: &PgPool,
    id: i64,
    status: ModerationStatus,
) -> ServiceResult<Testimonial> {
    let row = sqlx::query_as::<_, TestimonialRow>(&format!(
        "UPDATE testimonials SET status = $2 WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(status.as_str())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::TestimonialNotFound))?;
    Ok(row.into())
}

pub async fn delete(pool: &PgPool, id: i64) -> ServiceResult<()> {
    let result = sqlx::query("DELETE FROM testimonials WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::new(ErrorCode::TestimonialNotFound).into());
    }
    Ok(())
}
