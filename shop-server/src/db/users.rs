//! User database operations

use shared::error::{AppError, ErrorCode};
use shared::models::{ProfileUpdate, User};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use crate::core::ServiceResult;
use crate::core::error::unique_or;

const COLUMNS: &str =
    "id, name, email, password_hash, role, phone, avatar, is_active, created_at, updated_at";

pub async fn find_by_id(pool: &PgPool, id: i64) -> ServiceResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Lookup by email (case-insensitive; emails are stored lowercase)
pub async fn find_by_email(pool: &PgPool, email: &str) -> ServiceResult<Option<User>> {
    let user =
        sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE email = $1"))
            .bind(email.trim().to_lowercase())
            .fetch_optional(pool)
            .await?;
    Ok(user)
}

pub async fn create(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
    role: &str,
    phone: Option<&str>,
) -> ServiceResult<User> {
    let now = now_millis();
    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (id, name, email, password_hash, role, phone, is_active, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $7) RETURNING {COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(name.trim())
    .bind(email.trim().to_lowercase())
    .bind(password_hash)
    .bind(role)
    .bind(phone)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| unique_or(e, || AppError::new(ErrorCode::EmailAlreadyRegistered)))?;
    Ok(user)
}

pub async fn update_profile(pool: &PgPool, id: i64, data: &ProfileUpdate) -> ServiceResult<User> {
    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET name = COALESCE($2, name), phone = COALESCE($3, phone), \
         avatar = COALESCE($4, avatar), updated_at = $5 WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(data.name.as_deref().map(str::trim))
    .bind(data.phone.as_deref())
    .bind(data.avatar.as_deref())
    .bind(now_millis())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(user)
}

pub async fn update_password(pool: &PgPool, id: i64, password_hash: &str) -> ServiceResult<()> {
    let result = sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .bind(now_millis())
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::new(ErrorCode::UserNotFound).into());
    }
    Ok(())
}

pub async fn count_by_role(pool: &PgPool, role: &str) -> ServiceResult<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = $1")
        .bind(role)
        .fetch_one(pool)
        .await?;
    Ok(count)
}
