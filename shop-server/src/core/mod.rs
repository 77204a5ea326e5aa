//! 核心模块 - 服务器配置、状态和错误定义
//!
//! - [`Config`] - 服务器配置
//! - [`ServerState`] - 服务器状态
//! - [`Server`] - HTTP 服务器
//! - [`ServiceError`] - 服务层错误

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use server::{Server, build_app};
pub use state::ServerState;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
