//! 认证授权模块
//!
//! - [`JwtService`] - JWT 令牌服务
//! - [`CurrentUser`] - 当前用户上下文
//! - [`require_auth`] - 认证中间件
//! - [`require_permission`] / [`require_any_permission`] - 权限检查中间件
//! - [`permissions`] - 角色权限表

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod permissions;

pub use jwt::{Claims, CurrentUser, JwtError, JwtService};
pub use middleware::{is_public_route, require_any_permission, require_auth, require_permission};
