use std::collections::VecDeque;
use std::sync::{
    Arc, Mutex, Weak,
    atomic::{AtomicU64, Ordering},
};

use tracing::{debug, info, warn};

use crate::clients::{persist::NotificationCreator, toast::ToastPresenter};
use crate::models::notification::Notification;

type ObserverFn = Arc<dyn Fn(&Notification) + Send + Sync>;

/// Bounded, ordered notification collection with observer fan-out.
///
/// Newest first, capacity-bounded (oldest evicted), and idempotent on
/// notification id: inserting an id that is already present is a no-op and
/// produces no fan-out. Entries are immutable once inserted except for the
/// `read` flag.
pub struct NotificationStore {
    capacity: usize,
    entries: Mutex<VecDeque<Notification>>,
    observers: Mutex<Vec<(u64, ObserverFn)>>,
    next_observer_id: AtomicU64,
    toast: Option<Arc<dyn ToastPresenter>>,
    creator: Option<Arc<dyn NotificationCreator>>,
}

impl NotificationStore {
    pub fn new(capacity: usize) -> Self {
        info!(capacity, "Notification store initialized");

        Self {
            capacity,
            entries: Mutex::new(VecDeque::new()),
            observers: Mutex::new(Vec::new()),
            next_observer_id: AtomicU64::new(1),
            toast: None,
            creator: None,
        }
    }

    /// Transient toast surface invoked on every successful insert.
    pub fn with_toast(mut self, toast: Arc<dyn ToastPresenter>) -> Self {
        self.toast = Some(toast);
        self
    }

    /// Best-effort server-side persistence; failures are logged, never
    /// propagated, and never roll back the in-memory insert.
    pub fn with_creator(mut self, creator: Arc<dyn NotificationCreator>) -> Self {
        self.creator = Some(creator);
        self
    }

    /// Inserts `notification` unless an entry with the same id already
    /// exists. Returns whether the insert happened.
    pub fn insert(&self, notification: Notification) -> bool {
        {
            let mut entries = self.entries.lock().expect("notification store poisoned");

            if entries.iter().any(|n| n.id == notification.id) {
                debug!(id = %notification.id, "Duplicate notification, skipping");
                return false;
            }

            entries.push_front(notification.clone());

            while entries.len() > self.capacity {
                entries.pop_back();
            }
        }

        if let Some(toast) = &self.toast {
            toast.show(notification.kind, &notification.title, &notification.body);
        }

        if let Some(creator) = &self.creator {
            if let Err(e) = creator.persist(&notification) {
                warn!(id = %notification.id, error = %e, "Best-effort notification persist failed");
            }
        }

        // Fan out over a snapshot so observers may unsubscribe mid-delivery.
        let observers: Vec<ObserverFn> = {
            let observers = self.observers.lock().expect("observer list poisoned");
            observers.iter().map(|(_, f)| Arc::clone(f)).collect()
        };

        for observer in observers {
            observer(&notification);
        }

        true
    }

    /// Marks the matching entry read. Unknown ids are a no-op: the caller may
    /// race with eviction.
    pub fn mark_read(&self, id: &str) {
        let mut entries = self.entries.lock().expect("notification store poisoned");

        if let Some(entry) = entries.iter_mut().find(|n| n.id == id) {
            entry.read = true;
        }
    }

    pub fn mark_all_read(&self) {
        let mut entries = self.entries.lock().expect("notification store poisoned");

        for entry in entries.iter_mut() {
            entry.read = true;
        }
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .expect("notification store poisoned")
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("notification store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn unread_count(&self) -> usize {
        self.entries
            .lock()
            .expect("notification store poisoned")
            .iter()
            .filter(|n| !n.read)
            .count()
    }

    /// Current entries, newest first.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .expect("notification store poisoned")
            .iter()
            .cloned()
            .collect()
    }

    /// Registers an observer that receives every subsequent insert. The
    /// returned guard unsubscribes on drop or explicit `unsubscribe()`.
    pub fn subscribe(
        self: &Arc<Self>,
        observer: impl Fn(&Notification) + Send + Sync + 'static,
    ) -> StoreSubscription {
        let id = self.next_observer_id.fetch_add(1, Ordering::SeqCst);

        self.observers
            .lock()
            .expect("observer list poisoned")
            .push((id, Arc::new(observer)));

        StoreSubscription {
            id,
            store: Arc::downgrade(self),
        }
    }

    fn unsubscribe(&self, id: u64) {
        self.observers
            .lock()
            .expect("observer list poisoned")
            .retain(|(observer_id, _)| *observer_id != id);
    }
}

/// Handle to one registered store observer.
pub struct StoreSubscription {
    id: u64,
    store: Weak<NotificationStore>,
}

impl StoreSubscription {
    pub fn unsubscribe(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.unsubscribe(self.id);
        }

        self.store = Weak::new();
    }
}

impl Drop for StoreSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
