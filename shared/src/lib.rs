//! Shared types for the restaurant ordering service
//!
//! Domain models, the menu layout merge, the order lifecycle state machine,
//! the dashboard push protocol and the unified error system. Pure logic only:
//! no I/O happens in this crate.

pub mod error;
pub mod live;
pub mod menu;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use serde::{Deserialize, Serialize};
