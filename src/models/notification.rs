use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt::{Display, Formatter, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OrderCreated,
    OrderStatusChanged,
    PaymentCompleted,
    MessageReceived,
}

/// A typed, user-facing notification.
///
/// `id` is deterministic: re-delivery of the same logical change event by the
/// transport produces the same id, which is what the store's dedup keys on.
/// Immutable after creation except for `read`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,

    /// Entity references for UI drill-down (order, product, message).
    pub payload: JsonValue,

    pub created_at: DateTime<Utc>,
    pub read: bool,
}

impl Notification {
    pub fn new(id: String, kind: NotificationKind, title: String, body: String) -> Self {
        Self {
            id,
            kind,
            title,
            body,
            payload: serde_json::json!({}),
            created_at: Utc::now(),
            read: false,
        }
    }

    pub fn with_payload(mut self, payload: JsonValue) -> Self {
        self.payload = payload;
        self
    }
}

impl Display for NotificationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            NotificationKind::OrderCreated => write!(f, "order_created"),
            NotificationKind::OrderStatusChanged => write!(f, "order_status_changed"),
            NotificationKind::PaymentCompleted => write!(f, "payment_completed"),
            NotificationKind::MessageReceived => write!(f, "message_received"),
        }
    }
}
