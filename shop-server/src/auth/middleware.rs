//! 认证中间件
//!
//! JWT 认证和权限检查的 Axum 中间件

use std::future::Future;
use std::pin::Pin;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::Method;

use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::db::users;
use crate::security_log;
use crate::utils::{AppError, ErrorCode};

/// Catalog prefixes readable without a token
const PUBLIC_READ_PREFIXES: &[&str] = &["/api/products", "/api/categories", "/api/brands"];

/// Exact paths readable without a token
const PUBLIC_READ_PATHS: &[&str] = &["/api/testimonials", "/api/site-settings"];

const PUBLIC_POST_PATHS: &[&str] = &["/api/auth/login", "/api/auth/register"];

fn matches_prefix(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Routes that skip authentication
///
/// - `OPTIONS *` (CORS 预检)
/// - 非 `/api/` 路径 (health, uploads)
/// - 登录、注册
/// - 商品、分类、品牌、公开评价、站点设置的 GET 请求
pub fn is_public_route(method: &Method, path: &str) -> bool {
    if method == Method::OPTIONS || !path.starts_with("/api/") {
        return true;
    }
    if method == Method::POST && PUBLIC_POST_PATHS.contains(&path) {
        return true;
    }
    if method == Method::GET || method == Method::HEAD {
        return PUBLIC_READ_PATHS.contains(&path)
            || PUBLIC_READ_PREFIXES
                .iter()
                .any(|prefix| matches_prefix(path, prefix));
    }
    false
}

/// 校验 Bearer 令牌并加载账户
///
/// 令牌只证明身份；账户状态和角色以数据库为准，
/// 停用或删除的账户在令牌过期前也会被拒绝。
///
/// | 错误 | HTTP 状态码 |
/// |------|------------|
/// | 无 Authorization 头 | 401 NotAuthenticated |
/// | 令牌过期 | 401 TokenExpired |
/// | 无效令牌 / 用户不存在 | 401 TokenInvalid |
/// | 账户已停用 | 401 AccountDisabled |
pub async fn authenticate(
    state: &ServerState,
    auth_header: Option<&str>,
    uri: &str,
) -> Result<CurrentUser, AppError> {
    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = uri);
            return Err(AppError::not_authenticated());
        }
    };

    let claims = match state.get_jwt_service().validate_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            security_log!("WARN", "auth_failed", error = e.to_string(), uri = uri);
            return Err(match e {
                JwtError::ExpiredToken => AppError::token_expired(),
                _ => AppError::invalid_token("Invalid token"),
            });
        }
    };

    let mut user = CurrentUser::try_from(claims)
        .map_err(|e| AppError::invalid_token(format!("Malformed JWT claims: {e}")))?;

    let account = users::find_by_id(&state.pool, user.id)
        .await?
        .ok_or_else(|| {
            security_log!("WARN", "auth_unknown_user", user_id = user.id, uri = uri);
            AppError::invalid_token("Invalid token")
        })?;
    if !account.is_active {
        security_log!("WARN", "auth_disabled", user_id = user.id, uri = uri);
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    user.email = account.email;
    user.role = account.role;
    Ok(user)
}

/// 认证中间件
///
/// 公开路由直接放行；其余请求经 [`authenticate`] 校验后
/// 将 [`CurrentUser`] 注入请求扩展。
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_public_route(req.method(), req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::to_owned);
    let path = req.uri().path().to_owned();
    let user = authenticate(&state, auth_header.as_deref(), &path).await?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

type MiddlewareFuture = Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send>>;

/// 权限检查中间件 - 要求特定权限
///
/// ```ignore
/// Router::new()
///     .route("/", post(handler::create))
///     .layer(middleware::from_fn(require_permission("manage_products")));
/// ```
///
/// 无权限返回 403 PermissionDenied
pub fn require_permission(
    permission: &'static str,
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req
                .extensions()
                .get::<CurrentUser>()
                .ok_or_else(AppError::not_authenticated)?;

            if !user.has_permission(permission) {
                security_log!(
                    "WARN",
                    "permission_denied",
                    user_id = user.id,
                    role = user.role.as_str(),
                    required_permission = permission
                );
                return Err(AppError::permission_denied(format!(
                    "Permission denied: {permission}"
                )));
            }

            Ok(next.run(req).await)
        })
    }
}

/// 权限检查中间件 - 满足任一权限即可
pub fn require_any_permission(
    permissions: &'static [&'static str],
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req
                .extensions()
                .get::<CurrentUser>()
                .ok_or_else(AppError::not_authenticated)?;

            if !user.has_any_permission(permissions) {
                security_log!(
                    "WARN",
                    "permission_denied",
                    user_id = user.id,
                    role = user.role.as_str(),
                    required_permission = permissions.join("|")
                );
                return Err(AppError::permission_denied(format!(
                    "Permission denied: one of {}",
                    permissions.join(", ")
                )));
            }

            Ok(next.run(req).await)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_routes() {
        assert!(is_public_route(&Method::GET, "/health"));
        assert!(is_public_route(&Method::GET, "/uploads/abc.png"));
        assert!(is_public_route(&Method::OPTIONS, "/api/orders"));
        assert!(is_public_route(&Method::POST, "/api/auth/login"));
        assert!(is_public_route(&Method::POST, "/api/auth/register"));
        assert!(is_public_route(&Method::GET, "/api/products"));
        assert!(is_public_route(&Method::GET, "/api/products/42/reviews"));
        assert!(is_public_route(&Method::GET, "/api/categories/tree"));
        assert!(is_public_route(&Method::GET, "/api/brands/3"));
        assert!(is_public_route(&Method::GET, "/api/testimonials"));
        assert!(is_public_route(&Method::GET, "/api/site-settings"));
    }

    #[test]
    fn test_protected_routes() {
        assert!(!is_public_route(&Method::GET, "/api/auth/me"));
        assert!(!is_public_route(&Method::POST, "/api/products"));
        assert!(!is_public_route(&Method::POST, "/api/products/42/reviews"));
        assert!(!is_public_route(&Method::GET, "/api/testimonials/all"));
        assert!(!is_public_route(&Method::PUT, "/api/site-settings"));
        assert!(!is_public_route(&Method::GET, "/api/cart"));
        assert!(!is_public_route(&Method::GET, "/api/productsx"));
        assert!(!is_public_route(&Method::GET, "/api/orders"));
    }
}
