//! Order Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::order::{OrderSource, OrderStatus};

/// Order with its frozen line items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub restaurant_id: i64,
    /// None once the table has been deleted
    pub table_id: Option<i64>,
    /// Table name captured when the order was placed
    pub table_name: String,
    pub source: OrderSource,
    pub status: OrderStatus,
    pub cancel_reason: Option<String>,
    pub paid: bool,
    pub is_locked: bool,
    pub note: Option<String>,
    pub total: Decimal,
    pub created_at: i64,
    pub updated_at: i64,
    pub paid_at: Option<i64>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// Line item snapshot. Name and price never follow later catalog edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    /// Catalog reference only, the item may since have been deleted
    pub menu_item_id: Option<i64>,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub note: Option<String>,
    pub position: i32,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Requested line: the server looks up name and price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub menu_item_id: i64,
    pub quantity: i32,
    pub note: Option<String>,
}

/// Customer order from the public ordering page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicOrderCreate {
    pub restaurant_id: i64,
    pub table_id: i64,
    pub items: Vec<OrderItemInput>,
    pub note: Option<String>,
}

/// Order entered by staff (restaurant taken from the session)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffOrderCreate {
    pub table_id: i64,
    pub items: Vec<OrderItemInput>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
    pub reason: Option<String>,
}

/// Wholesale replacement of an order's items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemsReplace {
    pub items: Vec<OrderItemInput>,
}

/// Query string for the order list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    pub limit: Option<i64>,
}

/// Active orders of one table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveTableOrders {
    pub table_id: i64,
    pub table_name: String,
    pub orders: Vec<Order>,
}

/// Dashboard view of all non-terminal orders
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveOrders {
    pub tables: Vec<ActiveTableOrders>,
    /// Orders whose table was deleted after they were placed
    pub unassigned: Vec<Order>,
}

impl ActiveOrders {
    /// Group orders by table, keeping the first-seen table order.
    pub fn group(orders: Vec<Order>) -> Self {
        let mut active = Self::default();
        for order in orders {
            match order.table_id {
                Some(table_id) => {
                    match active.tables.iter_mut().find(|t| t.table_id == table_id) {
                        Some(group) => group.orders.push(order),
                        None => active.tables.push(ActiveTableOrders {
                            table_id,
                            table_name: order.table_name.clone(),
                            orders: vec![order],
                        }),
                    }
                }
                None => active.unassigned.push(order),
            }
        }
        active
    }
}

/// Response of the print endpoint. Printing never fails the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintResult {
    pub printed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: i64, table_id: Option<i64>, table_name: &str) -> Order {
        Order {
            id,
            restaurant_id: 1,
            table_id,
            table_name: table_name.to_string(),
            source: OrderSource::Customer,
            status: OrderStatus::Pending,
            cancel_reason: None,
            paid: false,
            is_locked: false,
            note: None,
            total: Decimal::ZERO,
            created_at: 0,
            updated_at: 0,
            paid_at: None,
            items: vec![],
        }
    }

    #[test]
    fn group_by_table_keeps_orphans() {
        let active = ActiveOrders::group(vec![
            order(1, Some(10), "T1"),
            order(2, None, "Patio 3"),
            order(3, Some(11), "T2"),
            order(4, Some(10), "T1"),
        ]);

        assert_eq!(active.tables.len(), 2);
        assert_eq!(active.tables[0].table_id, 10);
        let ids: Vec<i64> = active.tables[0].orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(active.tables[1].table_name, "T2");

        assert_eq!(active.unassigned.len(), 1);
        assert_eq!(active.unassigned[0].table_name, "Patio 3");
    }

    #[test]
    fn line_total_multiplies_quantity() {
        let item = OrderItem {
            id: 1,
            order_id: 1,
            menu_item_id: Some(5),
            name: "Soup".into(),
            price: Decimal::new(450, 2),
            quantity: 3,
            note: None,
            position: 0,
        };
        assert_eq!(item.line_total(), Decimal::new(1350, 2));
    }
}
