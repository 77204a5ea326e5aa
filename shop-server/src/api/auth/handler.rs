//! Authentication Handlers
//!
//! Registration, login and self-service profile management

use std::time::Duration;

use axum::{Json, extract::State};
use shared::models::{
    AuthResponse, DEFAULT_ROLE, LoginRequest, PasswordChange, ProfileUpdate, RegisterRequest,
    User, UserProfile,
};

use crate::api::{ApiResult, ok, ok_with_message};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::users;
use crate::security_log;
use crate::utils::password::{hash_password, verify_password};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, MAX_URL_LEN, validate_email, validate_optional_text,
    validate_password, validate_required_text,
};
use crate::utils::{AppError, ErrorCode};

/// Fixed delay before answering a failed login
const AUTH_FIXED_DELAY_MS: u64 = 300;

fn issue_token(state: &ServerState, user: User) -> ApiResult<AuthResponse> {
    let token = state
        .get_jwt_service()
        .generate_token(user.id, &user.email, &user.role)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))?;
    ok(AuthResponse {
        token,
        user: user.into(),
    })
}

/// POST /api/auth/register - 注册顾客账号
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<AuthResponse> {
    validate_required_text(&req.name, "name", MAX_NAME_LEN)?;
    validate_email(&req.email)?;
    validate_password(&req.password)?;
    validate_optional_text(&req.phone, "phone", MAX_SHORT_TEXT_LEN)?;

    let hash = hash_password(&req.password)?;
    let user = users::create(
        &state.pool,
        &req.name,
        &req.email,
        &hash,
        DEFAULT_ROLE,
        req.phone.as_deref(),
    )
    .await?;

    tracing::info!(user_id = user.id, email = %user.email, "User registered");
    issue_token(&state, user)
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<AuthResponse> {
    validate_email(&req.email)?;
    let user = users::find_by_email(&state.pool, &req.email).await?;

    // 统一错误信息，避免枚举邮箱
    let user = match user {
        Some(u) if verify_password(&req.password, &u.password_hash) => u,
        _ => {
            tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;
            security_log!("WARN", "login_failed", email = req.email.as_str());
            return Err(AppError::invalid_credentials());
        }
    };

    if !user.is_active {
        security_log!("WARN", "login_disabled", user_id = user.id);
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    tracing::info!(user_id = user.id, role = %user.role, "User logged in");
    issue_token(&state, user)
}

/// GET /api/auth/me
pub async fn me(State(state): State<ServerState>, user: CurrentUser) -> ApiResult<UserProfile> {
    let found = users::find_by_id(&state.pool, user.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    ok(found.into())
}

/// PUT /api/auth/profile
pub async fn update_profile(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(req): Json<ProfileUpdate>,
) -> ApiResult<UserProfile> {
    if let Some(name) = &req.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&req.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&req.avatar, "avatar", MAX_URL_LEN)?;

    let updated = users::update_profile(&state.pool, user.id, &req).await?;
    ok(updated.into())
}

/// PUT /api/auth/password
pub async fn change_password(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(req): Json<PasswordChange>,
) -> ApiResult<()> {
    validate_password(&req.new_password)?;
    let found = users::find_by_id(&state.pool, user.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    if !verify_password(&req.current_password, &found.password_hash) {
        security_log!("WARN", "password_change_rejected", user_id = user.id);
        return Err(AppError::invalid_credentials());
    }

    let hash = hash_password(&req.new_password)?;
    users::update_password(&state.pool, user.id, &hash).await?;
    tracing::info!(user_id = user.id, "Password changed");
    ok_with_message("Password updated")
}
