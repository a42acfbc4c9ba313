//! Menu Model

use serde::{Deserialize, Serialize};

use crate::menu::{MenuLayout, MergedMenu};

/// Saved menu: a named layout over the catalog that can be published
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Menu {
    pub id: i64,
    pub restaurant_id: i64,
    pub name: String,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub layout: MenuLayout,
    /// Bumped on every save
    pub version: i32,
    pub published: bool,
    pub published_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Menu list entry (layout omitted)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MenuSummary {
    pub id: i64,
    pub name: String,
    pub version: i32,
    pub published: bool,
    pub published_at: Option<i64>,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuCreate {
    pub name: String,
    pub layout: Option<MenuLayout>,
}

/// Save payload: rename and/or replace the layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuUpdate {
    pub name: Option<String>,
    pub layout: Option<MenuLayout>,
}

/// A saved menu merged with the current catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuDetail {
    #[serde(flatten)]
    pub menu: Menu,
    pub merged: MergedMenu,
}

/// What the public ordering page receives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedMenu {
    pub restaurant_id: i64,
    pub menu_id: i64,
    pub name: String,
    pub version: i32,
    pub currency: String,
    pub categories: Vec<crate::menu::MergedCategory>,
}
