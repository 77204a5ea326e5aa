//! Data models
//!
//! Shared between shop-server and its clients (via API).
//! Flat row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`;
//! aggregates with child collections are assembled by the server.
//! All IDs are `i64` snowflakes, all timestamps are Unix millis.

pub mod analytics;
pub mod brand;
pub mod cart;
pub mod category;
pub mod coupon;
pub mod order;
pub mod product;
pub mod purchase;
pub mod review;
pub mod sale;
pub mod site_settings;
pub mod supplier;
pub mod testimonial;
pub mod user;
pub mod wishlist;

// Re-exports
pub use analytics::*;
pub use brand::*;
pub use cart::*;
pub use category::*;
pub use coupon::*;
pub use order::*;
pub use product::*;
pub use purchase::*;
pub use review::*;
pub use sale::*;
pub use site_settings::*;
pub use supplier::*;
pub use testimonial::*;
pub use user::*;
pub use wishlist::*;
