//! OrderHub: live order fan-out to dashboards
//!
//! ```text
//! order handlers (create / status / pay / items / delete)
//!       │ LiveMessage
//!       ▼
//! OrderHub
//!   └── restaurants: restaurant_id → broadcast::Sender<LiveMessage>
//!           │
//!           ▼
//!       /api/socket sessions of that restaurant
//! ```
//!
//! Delivery is fire-and-forget: nothing is cached, a late subscriber only
//! sees messages published after it subscribed.

use dashmap::DashMap;
use shared::live::LiveMessage;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Broadcast channel capacity, enough to absorb a burst of orders
const BROADCAST_CAPACITY: usize = 256;

/// Live order channels, strictly isolated per restaurant
#[derive(Clone, Default)]
pub struct OrderHub {
    /// restaurant_id → sender
    restaurants: Arc<DashMap<i64, broadcast::Sender<LiveMessage>>>,
}

impl OrderHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a message to every dashboard of the restaurant.
    ///
    /// Never fails: with no subscriber the message is dropped, and the idle
    /// channel is pruned.
    pub fn publish(&self, restaurant_id: i64, message: LiveMessage) {
        let Some(tx) = self.restaurants.get(&restaurant_id).map(|tx| tx.clone()) else {
            tracing::debug!(restaurant_id, kind = message.kind(), "No live subscribers");
            return;
        };

        let kind = message.kind();
        match tx.send(message) {
            Ok(receivers) => tracing::debug!(restaurant_id, kind, receivers, "Live message sent"),
            Err(_) => self.prune(restaurant_id),
        }
    }

    /// Subscribe to the restaurant's live messages
    pub fn subscribe(&self, restaurant_id: i64) -> broadcast::Receiver<LiveMessage> {
        self.restaurants
            .entry(restaurant_id)
            .or_insert_with(|| broadcast::channel(BROADCAST_CAPACITY).0)
            .subscribe()
    }

    /// Drop the restaurant's channel once its last subscriber is gone
    pub fn prune(&self, restaurant_id: i64) {
        self.restaurants
            .remove_if(&restaurant_id, |_, tx| tx.receiver_count() == 0);
    }

    pub fn subscriber_count(&self, restaurant_id: i64) -> usize {
        self.restaurants
            .get(&restaurant_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Restaurants with a live channel
    pub fn restaurant_count(&self) -> usize {
        self.restaurants.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_messages() {
        let hub = OrderHub::new();
        let mut rx = hub.subscribe(1);

        hub.publish(1, LiveMessage::OrderDeleted { order_id: 42 });

        match rx.recv().await.unwrap() {
            LiveMessage::OrderDeleted { order_id } => assert_eq!(order_id, 42),
            other => panic!("Expected OrderDeleted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn restaurants_are_isolated() {
        let hub = OrderHub::new();
        let mut rx_a = hub.subscribe(1);
        let mut rx_b = hub.subscribe(2);

        hub.publish(1, LiveMessage::OrderDeleted { order_id: 7 });

        assert!(matches!(
            rx_a.recv().await.unwrap(),
            LiveMessage::OrderDeleted { order_id: 7 }
        ));
        assert!(matches!(
            rx_b.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let hub = OrderHub::new();
        hub.publish(9, LiveMessage::OrderDeleted { order_id: 1 });
        assert_eq!(hub.restaurant_count(), 0);
    }

    #[test]
    fn idle_channel_is_pruned() {
        let hub = OrderHub::new();
        let rx = hub.subscribe(3);
        assert_eq!(hub.subscriber_count(3), 1);

        hub.prune(3);
        assert_eq!(hub.restaurant_count(), 1);

        drop(rx);
        hub.publish(3, LiveMessage::OrderDeleted { order_id: 1 });
        assert_eq!(hub.restaurant_count(), 0);
        assert_eq!(hub.subscriber_count(3), 0);
    }
}
