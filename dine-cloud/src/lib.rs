//! dine-cloud: restaurant QR ordering service
//!
//! - Owners manage their restaurant, tables, catalog and menu layouts
//!   through the session-authenticated API
//! - Diners order from a table QR code through the public API
//! - Staff follow orders live over a WebSocket and print receipts through
//!   the local print bridge

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod live;
pub mod printing;
pub mod state;
pub mod util;

pub use config::Config;
pub use state::AppState;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
