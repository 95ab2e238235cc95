//! Publish/subscribe channel for application-wide signals.
//!
//! Replaces ambient shared state: views subscribe to the bus and react to
//! notifications, stock changes and order status changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::order::OrderStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A dismissible, user-facing message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }
}

/// Messages carried by the [`EventBus`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMessage {
    Notification(Notification),

    /// Stock levels of these products may have changed
    StockUpdated { product_ids: Vec<i64> },

    /// The backend reported a new status for an order
    OrderChanged { order_id: i64, status: OrderStatus },
}

/// Broadcast bus shared by every open view. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BusMessage>,
}

impl EventBus {
    /// Creates a bus keeping up to `capacity` undelivered messages per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes to all current subscribers and returns how many received
    /// it. With no subscribers the message is dropped.
    pub fn publish(&self, message: BusMessage) -> usize {
        self.sender.send(message).unwrap_or(0)
    }

    /// Publishes a user-facing notification. Returns the number of receivers.
    pub fn notify(&self, notification: Notification) -> usize {
        self.publish(BusMessage::Notification(notification))
    }

    /// Only messages published after this call are received.
    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.sender.subscribe()
    }

    /// Number of live subscribers
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
