//! Shop Server - 电商平台后端
//!
//! # 模块结构
//!
//! ```text
//! shop-server/src/
//! ├── core/          # 配置、状态、错误、HTTP 服务器
//! ├── auth/          # JWT 认证、角色权限
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # PostgreSQL 仓储 (sqlx)
//! └── utils/         # 日志、校验、密码哈希
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState, build_app};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

pub fn print_banner() {
    println!(
        r#"
   _____ __                 _____
  / ___// /_  ____  ____   / ___/___  ______   _____  _____
  \__ \/ __ \/ __ \/ __ \  \__ \/ _ \/ ___/ | / / _ \/ ___/
 ___/ / / / / /_/ / /_/ / ___/ /  __/ /   | |/ /  __/ /
/____/_/ /_/\____/ .___/ /____/\___/_/    |___/\___/_/
                /_/                               v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
