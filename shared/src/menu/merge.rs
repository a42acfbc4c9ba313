use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::layout::{LayoutCategory, LayoutItem, MenuLayout};
use crate::models::{MenuCategory, MenuItem};

/// Catalog merged with a saved layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedMenu {
    pub categories: Vec<MergedCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedCategory {
    pub id: i64,
    pub name: String,
    /// Catalog flag, applies to every menu
    pub is_visible: bool,
    /// Layout flag, applies to this menu only
    pub visible: bool,
    pub items: Vec<MergedItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedItem {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
}

impl MergedItem {
    fn new(item: &MenuItem, saved: Option<&LayoutItem>) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price,
            image_url: item.image_url.clone(),
            is_available: item.is_available,
            visible: saved.is_none_or(|s| s.visible),
            badge: saved.and_then(|s| s.badge.clone()),
        }
    }
}

/// Merge the catalog with a saved layout.
///
/// Entries in the layout keep their saved position, visibility and badge.
/// Catalog rows missing from the layout are appended visible and without a
/// badge, in catalog order (`display_order`, then id). Layout entries that no
/// longer match the catalog are dropped, and an item listed under a category
/// it has since left is treated as new in the category it now belongs to.
pub fn merge_layout(
    categories: &[MenuCategory],
    items: &[MenuItem],
    layout: &MenuLayout,
) -> MergedMenu {
    let mut catalog: Vec<&MenuCategory> = categories.iter().collect();
    catalog.sort_by_key(|c| (c.display_order, c.id));

    let mut items_by_category: HashMap<i64, Vec<&MenuItem>> = HashMap::new();
    for item in items {
        items_by_category.entry(item.category_id).or_default().push(item);
    }
    for list in items_by_category.values_mut() {
        list.sort_by_key(|i| (i.display_order, i.id));
    }

    let by_id: HashMap<i64, &MenuCategory> = catalog.iter().map(|c| (c.id, *c)).collect();
    let mut placed = HashSet::new();
    let mut merged = Vec::with_capacity(catalog.len());

    for saved in &layout.categories {
        let Some(category) = by_id.get(&saved.id) else {
            continue;
        };
        if !placed.insert(category.id) {
            continue;
        }
        merged.push(merge_category(category, Some(saved), &items_by_category));
    }
    for category in catalog {
        if placed.insert(category.id) {
            merged.push(merge_category(category, None, &items_by_category));
        }
    }

    MergedMenu { categories: merged }
}

fn merge_category(
    category: &MenuCategory,
    saved: Option<&LayoutCategory>,
    items_by_category: &HashMap<i64, Vec<&MenuItem>>,
) -> MergedCategory {
    let catalog_items = items_by_category
        .get(&category.id)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let by_id: HashMap<i64, &MenuItem> = catalog_items.iter().map(|i| (i.id, *i)).collect();

    let mut placed = HashSet::new();
    let mut items = Vec::with_capacity(catalog_items.len());

    if let Some(saved) = saved {
        for entry in &saved.items {
            let Some(item) = by_id.get(&entry.id) else {
                continue;
            };
            if placed.insert(item.id) {
                items.push(MergedItem::new(item, Some(entry)));
            }
        }
    }
    for item in catalog_items {
        if placed.insert(item.id) {
            items.push(MergedItem::new(item, None));
        }
    }

    MergedCategory {
        id: category.id,
        name: category.name.clone(),
        is_visible: category.is_visible,
        visible: saved.is_none_or(|s| s.visible),
        items,
    }
}

impl MergedMenu {
    /// Normalized layout of this view (every catalog row, current order)
    pub fn to_layout(&self) -> MenuLayout {
        MenuLayout {
            categories: self
                .categories
                .iter()
                .map(|c| LayoutCategory {
                    id: c.id,
                    visible: c.visible,
                    items: c
                        .items
                        .iter()
                        .map(|i| LayoutItem {
                            id: i.id,
                            visible: i.visible,
                            badge: i.badge.clone(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// What diners see: visible categories holding visible, available items
    pub fn published_view(&self) -> Vec<MergedCategory> {
        self.categories
            .iter()
            .filter(|c| c.is_visible && c.visible)
            .filter_map(|c| {
                let items: Vec<MergedItem> = c
                    .items
                    .iter()
                    .filter(|i| i.visible && i.is_available)
                    .cloned()
                    .collect();
                (!items.is_empty()).then(|| MergedCategory {
                    items,
                    ..c.clone()
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: i64, display_order: i32) -> MenuCategory {
        MenuCategory {
            id,
            restaurant_id: 1,
            name: format!("cat-{id}"),
            display_order,
            is_visible: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn item(id: i64, category_id: i64, display_order: i32) -> MenuItem {
        MenuItem {
            id,
            restaurant_id: 1,
            category_id,
            name: format!("item-{id}"),
            description: None,
            price: Decimal::new(500, 2),
            image_url: None,
            is_available: true,
            display_order,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn saved_item(id: i64, visible: bool, badge: Option<&str>) -> LayoutItem {
        LayoutItem {
            id,
            visible,
            badge: badge.map(str::to_string),
        }
    }

    fn ids(menu: &MergedMenu) -> Vec<(i64, Vec<i64>)> {
        menu.categories
            .iter()
            .map(|c| (c.id, c.items.iter().map(|i| i.id).collect()))
            .collect()
    }

    #[test]
    fn empty_layout_follows_catalog_order() {
        let categories = [category(2, 1), category(1, 0), category(3, 1)];
        let items = [item(12, 1, 5), item(11, 1, 0), item(21, 2, 0)];
        let merged = merge_layout(&categories, &items, &MenuLayout::default());

        assert_eq!(
            ids(&merged),
            vec![(1, vec![11, 12]), (2, vec![21]), (3, vec![])]
        );
        assert!(merged.categories.iter().all(|c| c.visible));
        assert!(
            merged
                .categories
                .iter()
                .flat_map(|c| &c.items)
                .all(|i| i.visible && i.badge.is_none())
        );
    }

    #[test]
    fn saved_entries_keep_order_visibility_and_badge() {
        let categories = [category(1, 0), category(2, 1)];
        let items = [item(11, 1, 0), item(12, 1, 1), item(13, 1, 2), item(21, 2, 0)];
        let layout = MenuLayout {
            categories: vec![
                LayoutCategory {
                    id: 2,
                    visible: false,
                    items: vec![],
                },
                LayoutCategory {
                    id: 1,
                    visible: true,
                    items: vec![
                        saved_item(13, true, Some("New")),
                        saved_item(11, false, None),
                    ],
                },
            ],
        };

        let merged = merge_layout(&categories, &items, &layout);
        assert_eq!(ids(&merged), vec![(2, vec![21]), (1, vec![13, 11, 12])]);

        assert!(!merged.categories[0].visible);
        // absent from the saved entry: defaults apply
        assert!(merged.categories[0].items[0].visible);

        let cat1 = &merged.categories[1];
        assert_eq!(cat1.items[0].badge.as_deref(), Some("New"));
        assert!(!cat1.items[1].visible);
        assert!(cat1.items[2].visible);
        assert!(cat1.items[2].badge.is_none());
    }

    #[test]
    fn stale_and_moved_entries() {
        let categories = [category(1, 0), category(2, 1)];
        // item 11 moved from category 1 to 2 after the layout was saved
        let items = [item(11, 2, 9), item(21, 2, 0)];
        let layout = MenuLayout {
            categories: vec![
                LayoutCategory {
                    id: 99,
                    visible: false,
                    items: vec![],
                },
                LayoutCategory {
                    id: 1,
                    visible: true,
                    items: vec![saved_item(11, false, Some("Hot")), saved_item(77, true, None)],
                },
            ],
        };

        let merged = merge_layout(&categories, &items, &layout);
        assert_eq!(ids(&merged), vec![(1, vec![]), (2, vec![21, 11])]);
        let moved = &merged.categories[1].items[1];
        assert!(moved.visible);
        assert!(moved.badge.is_none());
    }

    #[test]
    fn to_layout_normalizes() {
        let categories = [category(1, 0)];
        let items = [item(11, 1, 0), item(12, 1, 1)];
        let layout = MenuLayout {
            categories: vec![LayoutCategory {
                id: 1,
                visible: true,
                items: vec![saved_item(12, false, Some("Spicy"))],
            }],
        };
        let normalized = merge_layout(&categories, &items, &layout).to_layout();
        assert_eq!(
            normalized.categories[0].items,
            vec![saved_item(12, false, Some("Spicy")), saved_item(11, true, None)]
        );

        // merging the normalized layout again is a no-op
        let again = merge_layout(&categories, &items, &normalized).to_layout();
        assert_eq!(again, normalized);
    }

    #[test]
    fn published_view_hides_what_diners_should_not_see() {
        let mut hidden = category(2, 1);
        hidden.is_visible = false;
        let categories = [category(1, 0), hidden, category(3, 2), category(4, 3)];

        let mut sold_out = item(12, 1, 1);
        sold_out.is_available = false;
        let items = [item(11, 1, 0), sold_out, item(21, 2, 0), item(31, 3, 0), item(41, 4, 0)];

        let layout = MenuLayout {
            categories: vec![
                LayoutCategory {
                    id: 3,
                    visible: true,
                    items: vec![saved_item(31, false, None)],
                },
                LayoutCategory {
                    id: 4,
                    visible: false,
                    items: vec![],
                },
            ],
        };

        let view = merge_layout(&categories, &items, &layout).published_view();
        let visible: Vec<(i64, Vec<i64>)> = view
            .iter()
            .map(|c| (c.id, c.items.iter().map(|i| i.id).collect()))
            .collect();
        assert_eq!(visible, vec![(1, vec![11])]);
    }
}
