//! Dining Table Model

use serde::{Deserialize, Serialize};

/// Dining table entity, the unit a QR code points at
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DiningTable {
    pub id: i64,
    pub restaurant_id: i64,
    pub name: String,
    pub capacity: i32,
    pub is_active: bool,
    pub created_at: i64,

    /// Ordering page URL encoded in the table's QR code (filled by the API layer)
    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_url: Option<String>,
}

impl DiningTable {
    /// Attach the customer ordering URL for this table
    pub fn with_qr_url(mut self, public_base_url: &str) -> Self {
        self.qr_url = Some(format!(
            "{}/order/{}/{}",
            public_base_url.trim_end_matches('/'),
            self.restaurant_id,
            self.id
        ));
        self
    }
}

/// Create dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableCreate {
    pub name: String,
    pub capacity: Option<i32>,
}

/// Update dining table payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiningTableUpdate {
    pub name: Option<String>,
    pub capacity: Option<i32>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qr_url_points_at_ordering_page() {
        let table = DiningTable {
            id: 42,
            restaurant_id: 7,
            name: "T1".into(),
            capacity: 4,
            is_active: true,
            created_at: 0,
            qr_url: None,
        }
        .with_qr_url("https://dine.example.com/");
        assert_eq!(
            table.qr_url.as_deref(),
            Some("https://dine.example.com/order/7/42")
        );
    }
}
