//! API 路由模块
//!
//! 每个子模块提供 `router()`，由 [`crate::core::server::api_routes`] 合并。
//! 读路由与写路由分开组装，写路由通过 `require_permission` 中间件保护。
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 注册、登录、个人资料
//! - [`upload`] - 图片上传
//! - [`products`] / [`categories`] / [`brands`] - 商品目录
//! - [`cart`] / [`coupons`] / [`orders`] / [`wishlist`] - 购物流程
//! - [`reviews`] / [`testimonials`] - 评价与推荐语
//! - [`suppliers`] / [`purchases`] / [`sales`] - 采购与 POS
//! - [`site_settings`] / [`analytics`] - 站点设置与统计

pub mod auth;
pub mod health;
pub mod upload;

// Catalog
pub mod brands;
pub mod categories;
pub mod products;

// Shopping
pub mod cart;
pub mod coupons;
pub mod orders;
pub mod reviews;
pub mod testimonials;
pub mod wishlist;

// Back office
pub mod analytics;
pub mod purchases;
pub mod sales;
pub mod site_settings;
pub mod suppliers;

// Re-export common types for handlers
pub use crate::utils::{ApiResult, ok, ok_with_message};
