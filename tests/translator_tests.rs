use anyhow::Result;
use marketplace_realtime::{
    EventTranslator,
    models::{
        event::{EntityKind, RawChangeEvent},
        notification::NotificationKind,
    },
};
use serde_json::{Value as JsonValue, json};

const BUYER: &str = "buyer-1";
const SELLER: &str = "seller-1";

fn order(status: &str, payment_status: Option<&str>) -> JsonValue {
    let mut order = json!({
        "id": "o1",
        "buyer_id": BUYER,
        "seller_id": SELLER,
        "status": status,
        "product_title": "Film camera",
    });

    if let Some(payment_status) = payment_status {
        order["payment_status"] = json!(payment_status);
    }

    order
}

fn message(sender: &str, recipient: &str, context: Option<&str>) -> JsonValue {
    let mut message = json!({
        "id": "m1",
        "sender_id": sender,
        "recipient_id": recipient,
        "preview": "Is this still available?",
    });

    if let Some(context) = context {
        message["context"] = json!(context);
    }

    message
}

/// Test: order creation is announced differently to buyer and seller
#[test]
fn test_order_created_varies_by_role() -> Result<()> {
    let translator = EventTranslator::new();
    let event = RawChangeEvent::created(EntityKind::Order, order("pending", None));

    let to_buyer = translator.translate(&event, BUYER).expect("buyer notification");
    assert_eq!(to_buyer.kind, NotificationKind::OrderCreated);
    assert_eq!(to_buyer.id, "order-o1-created");
    assert_eq!(to_buyer.title, "Order placed");
    assert!(to_buyer.body.contains("Film camera"));

    let to_seller = translator.translate(&event, SELLER).expect("seller notification");
    assert_eq!(to_seller.kind, NotificationKind::OrderCreated);
    assert_eq!(to_seller.id, "order-o1-created");
    assert_eq!(to_seller.title, "New order");

    Ok(())
}

/// Test: an observer who is neither buyer nor seller gets nothing
#[test]
fn test_order_created_unrelated_observer() -> Result<()> {
    let translator = EventTranslator::new();
    let event = RawChangeEvent::created(EntityKind::Order, order("pending", None));

    assert!(translator.translate(&event, "someone-else").is_none());

    Ok(())
}

/// Test: cosmetic order edits produce no notification
#[test]
fn test_update_without_transition_is_filtered() -> Result<()> {
    let translator = EventTranslator::new();

    let before = order("pending", Some("pending"));
    let mut after = order("pending", Some("pending"));
    after["amount"] = json!(129.5);

    let event = RawChangeEvent::updated(EntityKind::Order, before, after);

    assert!(translator.translate(&event, BUYER).is_none());

    Ok(())
}

/// Test: a status transition yields exactly one status-changed notification
#[test]
fn test_status_transition() -> Result<()> {
    let translator = EventTranslator::new();
    let event = RawChangeEvent::updated(
        EntityKind::Order,
        order("pending", None),
        order("shipped", None),
    );

    let notification = translator.translate(&event, BUYER).expect("notification");

    assert_eq!(notification.kind, NotificationKind::OrderStatusChanged);
    assert_eq!(notification.id, "order-o1-status-shipped");
    assert!(notification.body.contains("shipped"));

    Ok(())
}

/// Test: payment completion wins over a simultaneous status transition
#[test]
fn test_payment_completed_takes_precedence() -> Result<()> {
    let translator = EventTranslator::new();
    let event = RawChangeEvent::updated(
        EntityKind::Order,
        order("pending", Some("pending")),
        order("paid", Some("completed")),
    );

    let notification = translator.translate(&event, SELLER).expect("notification");

    assert_eq!(notification.kind, NotificationKind::PaymentCompleted);
    assert_eq!(notification.id, "order-o1-payment-completed");

    Ok(())
}

/// Test: a payment transition to anything but completed falls through to the
/// status rule
#[test]
fn test_non_completed_payment_transition() -> Result<()> {
    let translator = EventTranslator::new();
    let event = RawChangeEvent::updated(
        EntityKind::Order,
        order("pending", Some("pending")),
        order("cancelled", Some("failed")),
    );

    let notification = translator.translate(&event, BUYER).expect("notification");

    assert_eq!(notification.kind, NotificationKind::OrderStatusChanged);

    Ok(())
}

/// Test: a missing product lookup falls back to a generic label
#[test]
fn test_missing_product_title_falls_back() -> Result<()> {
    let translator = EventTranslator::new();
    let mut snapshot = order("pending", None);
    snapshot.as_object_mut().unwrap().remove("product_title");

    let event = RawChangeEvent::created(EntityKind::Order, snapshot);
    let notification = translator.translate(&event, BUYER).expect("notification");

    assert!(notification.body.contains("your item"));

    Ok(())
}

/// Test: only commerce-conversation messages are notified
#[test]
fn test_message_requires_commerce_context() -> Result<()> {
    let translator = EventTranslator::new();

    let commerce =
        RawChangeEvent::created(EntityKind::Message, message(SELLER, BUYER, Some("commerce")));
    let notification = translator.translate(&commerce, BUYER).expect("notification");
    assert_eq!(notification.kind, NotificationKind::MessageReceived);
    assert_eq!(notification.id, "message-m1");
    assert_eq!(notification.body, "Is this still available?");

    let casual = RawChangeEvent::created(EntityKind::Message, message(SELLER, BUYER, None));
    assert!(translator.translate(&casual, BUYER).is_none());

    Ok(())
}

/// Test: a sender is not notified about their own outbound message
#[test]
fn test_own_message_not_notified() -> Result<()> {
    let translator = EventTranslator::new();
    let event =
        RawChangeEvent::created(EntityKind::Message, message(BUYER, SELLER, Some("commerce")));

    assert!(translator.translate(&event, BUYER).is_none());

    Ok(())
}

/// Test: malformed snapshots are dropped, not propagated
#[test]
fn test_malformed_snapshot_is_dropped() -> Result<()> {
    let translator = EventTranslator::new();
    let event = RawChangeEvent::created(EntityKind::Order, json!({ "bogus": true }));

    assert!(translator.translate(&event, BUYER).is_none());

    Ok(())
}

/// Test: metric rows never become notifications
#[test]
fn test_metric_events_are_ignored() -> Result<()> {
    let translator = EventTranslator::new();
    let event = RawChangeEvent::created(EntityKind::Metric, json!({ "views": 10 }));

    assert!(translator.translate(&event, BUYER).is_none());

    Ok(())
}

/// Test: order deletion produces no notification
#[test]
fn test_order_deleted_is_ignored() -> Result<()> {
    let translator = EventTranslator::new();
    let event = RawChangeEvent::deleted(EntityKind::Order, order("pending", None));

    assert!(translator.translate(&event, BUYER).is_none());

    Ok(())
}
