use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::models::{
    event::{EntityKind, MessageRecord, Operation, OrderRecord, PaymentStatus, RawChangeEvent},
    notification::{Notification, NotificationKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrderRole {
    Buyer,
    Seller,
}

/// Maps raw change events to at most one typed notification each.
///
/// Stateless. Rules are keyed by `(entity, operation)`; the first matching
/// rule wins, so a single Updated event never emits both a payment and a
/// status notification. Events that parse badly or match no rule are dropped,
/// never escalated: one malformed event must not take the subscription down.
pub struct EventTranslator;

impl EventTranslator {
    pub fn new() -> Self {
        Self
    }

    pub fn translate(&self, event: &RawChangeEvent, observer_id: &str) -> Option<Notification> {
        match event.entity {
            EntityKind::Order => self.translate_order(event, observer_id),
            EntityKind::Message => self.translate_message(event, observer_id),
            // Metric rows feed dashboard refreshes, not user notifications.
            EntityKind::Metric => None,
        }
    }

    fn translate_order(&self, event: &RawChangeEvent, observer_id: &str) -> Option<Notification> {
        match event.operation {
            Operation::Created => {
                let after: OrderRecord = parse_snapshot(event.after.as_ref(), "order.after")?;
                let role = order_role(&after, observer_id)?;
                let label = product_label(&after);

                let (title, body) = match role {
                    OrderRole::Buyer => (
                        "Order placed".to_string(),
                        format!("Your order for {} was placed.", label),
                    ),
                    OrderRole::Seller => (
                        "New order".to_string(),
                        format!("You received a new order for {}.", label),
                    ),
                };

                Some(
                    Notification::new(
                        format!("order-{}-created", after.id),
                        NotificationKind::OrderCreated,
                        title,
                        body,
                    )
                    .with_payload(order_payload(&after, event.after.as_ref())),
                )
            }
            Operation::Updated => {
                let before: OrderRecord = parse_snapshot(event.before.as_ref(), "order.before")?;
                let after: OrderRecord = parse_snapshot(event.after.as_ref(), "order.after")?;
                let role = order_role(&after, observer_id)?;
                let label = product_label(&after);

                // Payment completion takes precedence over a simultaneous
                // status transition; one notification per event.
                if before.payment_status != after.payment_status
                    && after.payment_status == Some(PaymentStatus::Completed)
                {
                    let (title, body) = match role {
                        OrderRole::Buyer => (
                            "Payment completed".to_string(),
                            format!("Your payment for {} went through.", label),
                        ),
                        OrderRole::Seller => (
                            "Payment received".to_string(),
                            format!("Payment received for {}.", label),
                        ),
                    };

                    return Some(
                        Notification::new(
                            format!("order-{}-payment-completed", after.id),
                            NotificationKind::PaymentCompleted,
                            title,
                            body,
                        )
                        .with_payload(order_payload(&after, event.after.as_ref())),
                    );
                }

                if before.status != after.status {
                    let body = match role {
                        OrderRole::Buyer => {
                            format!("Your order for {} is now {}.", label, after.status)
                        }
                        OrderRole::Seller => {
                            format!("Order for {} is now {}.", label, after.status)
                        }
                    };

                    return Some(
                        Notification::new(
                            format!("order-{}-status-{}", after.id, after.status),
                            NotificationKind::OrderStatusChanged,
                            "Order update".to_string(),
                            body,
                        )
                        .with_payload(order_payload(&after, event.after.as_ref())),
                    );
                }

                // Cosmetic field edit, deliberately filtered out.
                debug!(order_id = %after.id, "Order update without status transition, skipping");
                None
            }
            Operation::Deleted => None,
        }
    }

    fn translate_message(&self, event: &RawChangeEvent, observer_id: &str) -> Option<Notification> {
        if event.operation != Operation::Created {
            return None;
        }

        let message: MessageRecord = parse_snapshot(event.after.as_ref(), "message.after")?;

        if !message.is_commerce() {
            debug!(message_id = %message.id, "Non-commerce message, skipping");
            return None;
        }

        // Own outbound messages are not notified back to their sender.
        if message.sender_id == observer_id {
            return None;
        }

        let body = message
            .preview
            .clone()
            .unwrap_or_else(|| "You have a new message.".to_string());

        Some(
            Notification::new(
                format!("message-{}", message.id),
                NotificationKind::MessageReceived,
                "New message".to_string(),
                body,
            )
            .with_payload(serde_json::json!({
                "message_id": message.id,
                "sender_id": message.sender_id,
            })),
        )
    }
}

impl Default for EventTranslator {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_snapshot<T: DeserializeOwned>(value: Option<&JsonValue>, context: &str) -> Option<T> {
    let value = match value {
        Some(value) => value,
        None => {
            warn!(context, "Change event is missing a required snapshot");
            return None;
        }
    };

    match serde_json::from_value(value.clone()) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(context, error = %e, "Dropping change event with malformed snapshot");
            None
        }
    }
}

fn order_role(order: &OrderRecord, observer_id: &str) -> Option<OrderRole> {
    if order.buyer_id == observer_id {
        Some(OrderRole::Buyer)
    } else if order.seller_id == observer_id {
        Some(OrderRole::Seller)
    } else {
        debug!(order_id = %order.id, "Observer is neither buyer nor seller, skipping");
        None
    }
}

fn product_label(order: &OrderRecord) -> String {
    // The referenced product lookup is optional; fall back to a generic label
    // rather than failing the translation.
    order
        .product_title
        .clone()
        .unwrap_or_else(|| "your item".to_string())
}

fn order_payload(order: &OrderRecord, after: Option<&JsonValue>) -> JsonValue {
    serde_json::json!({
        "order_id": order.id,
        "order": after.cloned().unwrap_or(JsonValue::Null),
    })
}
