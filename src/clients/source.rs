use crate::models::event::RawChangeEvent;

/// Subscriber-identity predicate used to scope one stream, e.g.
/// `buyer_id = <user id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    pub column: String,
    pub value: String,
}

impl EventFilter {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// Callbacks invoked by the transport for one subscription attempt.
///
/// The transport calls at most one of `on_connected`/`on_error` per attempt,
/// and must never invoke any callback after the returned guard is cancelled.
pub struct SourceCallbacks {
    pub on_connected: Box<dyn Fn() + Send + Sync>,
    pub on_event: Box<dyn Fn(RawChangeEvent) + Send + Sync>,
    pub on_error: Box<dyn Fn(String) + Send + Sync>,
    pub on_closed: Box<dyn Fn() + Send + Sync>,
}

/// Cancels the underlying transport subscription on `cancel()` or drop.
pub struct SubscriptionGuard {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionGuard {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A guard with no transport-side teardown.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Server-pushed stream of typed change events, filtered by subscriber
/// identity. The actual transport lives outside this crate.
///
/// Implementations must not invoke callbacks synchronously from within
/// `subscribe`; connection outcomes arrive later on the transport's own
/// tasks.
pub trait ChangeEventSource: Send + Sync {
    fn subscribe(
        &self,
        stream_id: &str,
        filter: &EventFilter,
        callbacks: SourceCallbacks,
    ) -> SubscriptionGuard;
}
