use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{AppError, ErrorCode};
use crate::models::{MenuCategory, MenuItem};

/// Longest badge accepted on a layout item, in characters
pub const MAX_BADGE_LEN: usize = 32;

/// Saved per-menu overlay on the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuLayout {
    #[serde(default)]
    pub categories: Vec<LayoutCategory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutCategory {
    pub id: i64,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub items: Vec<LayoutItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutItem {
    pub id: i64,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Why a submitted layout was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("Unknown category {0}")]
    UnknownCategory(i64),
    #[error("Category {0} is listed more than once")]
    DuplicateCategory(i64),
    #[error("Unknown menu item {0}")]
    UnknownItem(i64),
    #[error("Menu item {0} is listed more than once")]
    DuplicateItem(i64),
    #[error("Menu item {item_id} does not belong to category {category_id}")]
    ItemOutsideCategory { item_id: i64, category_id: i64 },
    #[error("Badge of menu item {item_id} exceeds {MAX_BADGE_LEN} characters")]
    BadgeTooLong { item_id: i64 },
}

impl LayoutError {
    fn field(&self) -> &'static str {
        match self {
            Self::UnknownCategory(_) | Self::DuplicateCategory(_) => "categories",
            Self::UnknownItem(_) | Self::DuplicateItem(_) | Self::ItemOutsideCategory { .. } => {
                "items"
            }
            Self::BadgeTooLong { .. } => "badge",
        }
    }
}

impl From<LayoutError> for AppError {
    fn from(err: LayoutError) -> Self {
        let field = err.field();
        let app = AppError::with_message(ErrorCode::InvalidLayout, err.to_string())
            .with_detail("field", field);
        match err {
            LayoutError::UnknownCategory(id) | LayoutError::DuplicateCategory(id) => {
                app.with_detail("category_id", id)
            }
            LayoutError::UnknownItem(id)
            | LayoutError::DuplicateItem(id)
            | LayoutError::BadgeTooLong { item_id: id } => app.with_detail("item_id", id),
            LayoutError::ItemOutsideCategory {
                item_id,
                category_id,
            } => app
                .with_detail("item_id", item_id)
                .with_detail("category_id", category_id),
        }
    }
}

impl MenuLayout {
    /// Check a layout submitted by the dashboard against the current catalog.
    ///
    /// Stale entries are tolerated when merging a layout that was saved
    /// earlier, but a layout being saved must reference the catalog as it is.
    pub fn validate(&self, categories: &[MenuCategory], items: &[MenuItem]) -> Result<(), LayoutError> {
        let known_categories: HashSet<i64> = categories.iter().map(|c| c.id).collect();
        let item_category: HashMap<i64, i64> =
            items.iter().map(|i| (i.id, i.category_id)).collect();

        let mut seen_categories = HashSet::new();
        let mut seen_items = HashSet::new();

        for category in &self.categories {
            if !known_categories.contains(&category.id) {
                return Err(LayoutError::UnknownCategory(category.id));
            }
            if !seen_categories.insert(category.id) {
                return Err(LayoutError::DuplicateCategory(category.id));
            }
            for item in &category.items {
                let Some(&owner) = item_category.get(&item.id) else {
                    return Err(LayoutError::UnknownItem(item.id));
                };
                if owner != category.id {
                    return Err(LayoutError::ItemOutsideCategory {
                        item_id: item.id,
                        category_id: category.id,
                    });
                }
                if !seen_items.insert(item.id) {
                    return Err(LayoutError::DuplicateItem(item.id));
                }
                if item
                    .badge
                    .as_deref()
                    .is_some_and(|b| b.chars().count() > MAX_BADGE_LEN)
                {
                    return Err(LayoutError::BadgeTooLong { item_id: item.id });
                }
            }
        }
        Ok(())
    }
}
