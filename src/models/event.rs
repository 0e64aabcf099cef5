use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Order,
    Message,
    Metric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Created,
    Updated,
    Deleted,
}

/// One change event as delivered by the transport.
///
/// Snapshots stay untyped at this boundary; the translator deserializes them
/// into the record types below and drops events whose shape does not parse.
/// Updated carries both snapshots, Created only `after`, Deleted only
/// `before`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawChangeEvent {
    pub entity: EntityKind,
    pub operation: Operation,

    #[serde(default)]
    pub before: Option<JsonValue>,

    #[serde(default)]
    pub after: Option<JsonValue>,
}

impl RawChangeEvent {
    pub fn created(entity: EntityKind, after: JsonValue) -> Self {
        Self {
            entity,
            operation: Operation::Created,
            before: None,
            after: Some(after),
        }
    }

    pub fn updated(entity: EntityKind, before: JsonValue, after: JsonValue) -> Self {
        Self {
            entity,
            operation: Operation::Updated,
            before: Some(before),
            after: Some(after),
        }
    }

    pub fn deleted(entity: EntityKind, before: JsonValue) -> Self {
        Self {
            entity,
            operation: Operation::Deleted,
            before: Some(before),
            after: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,

    #[serde(other)]
    Unknown,
}

/// Order snapshot as carried in change-event payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub status: String,

    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,

    #[serde(default)]
    pub product_title: Option<String>,

    #[serde(default)]
    pub amount: Option<f64>,
}

/// Chat message snapshot. `context` is the routing marker: only messages in
/// commerce conversations produce notifications here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,

    #[serde(default)]
    pub context: Option<String>,

    #[serde(default)]
    pub preview: Option<String>,
}

impl MessageRecord {
    pub fn is_commerce(&self) -> bool {
        self.context.as_deref() == Some("commerce")
    }
}
