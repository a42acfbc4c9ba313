//! Dashboard WebSocket protocol
//!
//! Server → dashboard only. Each message is one JSON text frame tagged by
//! `type`. Delivery is fire-and-forget: a client that misses a message
//! refetches the order list.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Order, OrderItem};
use crate::order::{OrderSource, OrderStatus};
use crate::util::millis_to_rfc3339;

/// Server → dashboard push message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveMessage {
    /// Order just placed (customer or staff)
    NewOrder { order: Box<LiveOrder> },

    /// Status, payment or items changed
    OrderUpdated { order: Box<LiveOrder> },

    /// Order row deleted
    OrderDeleted { order_id: i64 },
}

impl LiveMessage {
    pub fn new_order(order: &Order) -> Self {
        Self::NewOrder {
            order: Box::new(LiveOrder::from(order)),
        }
    }

    pub fn order_updated(order: &Order) -> Self {
        Self::OrderUpdated {
            order: Box::new(LiveOrder::from(order)),
        }
    }

    /// Wire name of this message, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NewOrder { .. } => "new_order",
            Self::OrderUpdated { .. } => "order_updated",
            Self::OrderDeleted { .. } => "order_deleted",
        }
    }
}

/// Order as pushed to dashboards, timestamps as RFC 3339 strings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveOrder {
    pub id: i64,
    pub restaurant_id: i64,
    pub table_id: Option<i64>,
    pub table_name: String,
    pub source: OrderSource,
    pub status: OrderStatus,
    pub cancel_reason: Option<String>,
    pub paid: bool,
    pub is_locked: bool,
    pub note: Option<String>,
    pub total: Decimal,
    pub created_at: String,
    pub updated_at: String,
    pub paid_at: Option<String>,
    pub items: Vec<OrderItem>,
}

impl From<&Order> for LiveOrder {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            restaurant_id: order.restaurant_id,
            table_id: order.table_id,
            table_name: order.table_name.clone(),
            source: order.source,
            status: order.status,
            cancel_reason: order.cancel_reason.clone(),
            paid: order.paid,
            is_locked: order.is_locked,
            note: order.note.clone(),
            total: order.total,
            created_at: millis_to_rfc3339(order.created_at),
            updated_at: millis_to_rfc3339(order.updated_at),
            paid_at: order.paid_at.map(millis_to_rfc3339),
            items: order.items.clone(),
        }
    }
}
