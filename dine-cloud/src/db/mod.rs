//! Database access (PostgreSQL)
//!
//! Every staff query carries the session's `restaurant_id`. Rows of another
//! restaurant are indistinguishable from missing rows.

pub mod categories;
pub mod items;
pub mod menus;
pub mod orders;
pub mod restaurants;
pub mod tables;
pub mod users;
