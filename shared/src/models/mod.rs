//! Data models
//!
//! Shared between the service and its clients (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are snowflake `i64`, timestamps are Unix milliseconds.

pub mod category;
pub mod menu;
pub mod menu_item;
pub mod order;
pub mod restaurant;
pub mod table;
pub mod user;

// Re-exports
pub use category::*;
pub use menu::*;
pub use menu_item::*;
pub use order::*;
pub use restaurant::*;
pub use table::*;
pub use user::*;
