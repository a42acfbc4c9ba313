//! Menu layouts
//!
//! A saved menu does not copy the catalog. It stores a [`MenuLayout`]: the
//! order, visibility and badges of categories and items, keyed by id. The
//! catalog keeps changing underneath, so every read merges the two
//! ([`merge_layout`]) and publishing exposes the diner-facing subset
//! ([`MergedMenu::published_view`]).

mod layout;
mod merge;

pub use layout::{LayoutCategory, LayoutError, LayoutItem, MAX_BADGE_LEN, MenuLayout};
pub use merge::{MergedCategory, MergedItem, MergedMenu, merge_layout};
