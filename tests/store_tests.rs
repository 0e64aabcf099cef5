use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU32, Ordering},
};

use anyhow::{Result, anyhow};
use marketplace_realtime::{
    NotificationStore,
    clients::{persist::NotificationCreator, toast::ToastPresenter},
    models::notification::{Notification, NotificationKind},
};

fn notification(id: &str) -> Notification {
    Notification::new(
        id.to_string(),
        NotificationKind::OrderCreated,
        "Order placed".to_string(),
        "Your order for a camera was placed.".to_string(),
    )
}

struct CountingToast {
    shown: AtomicU32,
}

impl ToastPresenter for CountingToast {
    fn show(&self, _kind: NotificationKind, _title: &str, _body: &str) {
        self.shown.fetch_add(1, Ordering::SeqCst);
    }
}

struct FailingCreator;

impl NotificationCreator for FailingCreator {
    fn persist(&self, _notification: &Notification) -> Result<()> {
        Err(anyhow!("server unavailable"))
    }
}

/// Test: inserting the same notification id twice fans out exactly once
#[test]
fn test_duplicate_insert_is_deduplicated() -> Result<()> {
    let store = Arc::new(NotificationStore::new(50));
    let delivered = Arc::new(AtomicU32::new(0));

    let counter = Arc::clone(&delivered);
    let _subscription = store.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    assert!(store.insert(notification("order-o1-created")));
    assert!(!store.insert(notification("order-o1-created")));

    assert_eq!(store.len(), 1);
    assert_eq!(delivered.load(Ordering::SeqCst), 1, "Observer must see one insert");

    Ok(())
}

/// Test: the store holds at most its capacity, evicting oldest first
#[test]
fn test_capacity_evicts_oldest() -> Result<()> {
    let store = Arc::new(NotificationStore::new(5));

    for i in 0..8 {
        store.insert(notification(&format!("n{}", i)));
    }

    assert_eq!(store.len(), 5);

    let ids: Vec<String> = store.snapshot().into_iter().map(|n| n.id).collect();
    assert_eq!(ids, vec!["n7", "n6", "n5", "n4", "n3"], "Newest first, oldest evicted");

    Ok(())
}

/// Test: mark_read flips a single entry, unknown ids are a no-op
#[test]
fn test_mark_read() -> Result<()> {
    let store = Arc::new(NotificationStore::new(10));
    store.insert(notification("a"));
    store.insert(notification("b"));

    assert_eq!(store.unread_count(), 2);

    store.mark_read("a");
    assert_eq!(store.unread_count(), 1);

    // Caller may race with eviction; unknown ids never error.
    store.mark_read("evicted-long-ago");
    assert_eq!(store.unread_count(), 1);

    store.mark_all_read();
    assert_eq!(store.unread_count(), 0);

    Ok(())
}

/// Test: clear empties the store
#[test]
fn test_clear() -> Result<()> {
    let store = Arc::new(NotificationStore::new(10));
    store.insert(notification("a"));
    store.insert(notification("b"));

    store.clear();

    assert!(store.is_empty());

    Ok(())
}

/// Test: multiple observers each receive every insert, and a dropped
/// subscription stops receiving
#[test]
fn test_observer_fan_out_and_unsubscribe() -> Result<()> {
    let store = Arc::new(NotificationStore::new(10));
    let first = Arc::new(AtomicU32::new(0));
    let second = Arc::new(AtomicU32::new(0));

    let counter = Arc::clone(&first);
    let _first_subscription = store.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let counter = Arc::clone(&second);
    let second_subscription = store.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    store.insert(notification("a"));
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 1);

    drop(second_subscription);

    store.insert(notification("b"));
    assert_eq!(first.load(Ordering::SeqCst), 2);
    assert_eq!(second.load(Ordering::SeqCst), 1, "Dropped observer must not fire");

    Ok(())
}

/// Test: unsubscribing from inside a fan-out callback does not break delivery
#[test]
fn test_unsubscribe_during_fan_out() -> Result<()> {
    let store = Arc::new(NotificationStore::new(10));
    let second_guard = Arc::new(Mutex::new(None));
    let survivor_calls = Arc::new(AtomicU32::new(0));

    let guard_slot = Arc::clone(&second_guard);
    let _first_subscription = store.subscribe(move |_| {
        // Drops the other observer's guard mid-delivery.
        guard_slot.lock().unwrap().take();
    });

    let counter = Arc::clone(&survivor_calls);
    *second_guard.lock().unwrap() = Some(store.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    store.insert(notification("a"));
    let after_first = survivor_calls.load(Ordering::SeqCst);

    store.insert(notification("b"));
    assert_eq!(
        survivor_calls.load(Ordering::SeqCst),
        after_first,
        "Unsubscribed observer must not fire on later inserts"
    );

    Ok(())
}

/// Test: every successful insert triggers one toast, duplicates none
#[test]
fn test_toast_fires_per_insert() -> Result<()> {
    let toast = Arc::new(CountingToast {
        shown: AtomicU32::new(0),
    });

    let toast_presenter: Arc<dyn ToastPresenter> = Arc::clone(&toast) as Arc<dyn ToastPresenter>;
    let store = Arc::new(NotificationStore::new(10).with_toast(toast_presenter));

    store.insert(notification("a"));
    store.insert(notification("a"));
    store.insert(notification("b"));

    assert_eq!(toast.shown.load(Ordering::SeqCst), 2);

    Ok(())
}

/// Test: a failing best-effort persist never affects the in-memory insert
#[test]
fn test_persist_failure_is_absorbed() -> Result<()> {
    let store = Arc::new(NotificationStore::new(10).with_creator(Arc::new(FailingCreator)));
    let delivered = Arc::new(AtomicU32::new(0));

    let counter = Arc::clone(&delivered);
    let _subscription = store.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    assert!(store.insert(notification("a")));
    assert_eq!(store.len(), 1);
    assert_eq!(delivered.load(Ordering::SeqCst), 1);

    Ok(())
}
