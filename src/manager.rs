use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, sleep};
use tracing::{debug, info, warn};

use crate::clients::{
    identity::IdentityProvider,
    source::{ChangeEventSource, EventFilter, SourceCallbacks, SubscriptionGuard},
};
use crate::config::RealtimeConfig;
use crate::models::{
    event::{EntityKind, RawChangeEvent},
    retry::{ReconnectState, RetryDecision, next_attempt},
    status::{Connectivity, HandleStatus},
};
use crate::store::NotificationStore;
use crate::translator::EventTranslator;

pub type RawEventObserver = Arc<dyn Fn(&RawChangeEvent) + Send + Sync>;

/// Declaration of one logical stream the manager keeps subscribed.
///
/// `filter_column` is matched against the session user id by the transport.
/// Streams with `notify` unset skip translation entirely; a raw observer can
/// be installed instead, which is how dashboard-style consumers (metrics
/// refresh) share this component with the notification streams.
#[derive(Clone)]
pub struct StreamSpec {
    pub id: String,
    pub entity: EntityKind,
    pub filter_column: String,
    pub notify: bool,
    observer: Option<RawEventObserver>,
}

impl StreamSpec {
    pub fn new(
        id: impl Into<String>,
        entity: EntityKind,
        filter_column: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            entity,
            filter_column: filter_column.into(),
            notify: true,
            observer: None,
        }
    }

    /// Do not translate events from this stream into notifications.
    pub fn silent(mut self) -> Self {
        self.notify = false;
        self
    }

    /// Raw-event tap, invoked for every event on this stream.
    pub fn with_observer(mut self, observer: impl Fn(&RawChangeEvent) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }
}

/// The default marketplace stream set: orders where the user buys, orders
/// where the user sells, and inbound chat messages.
pub fn marketplace_streams() -> Vec<StreamSpec> {
    vec![
        StreamSpec::new("orders-as-buyer", EntityKind::Order, "buyer_id"),
        StreamSpec::new("orders-as-seller", EntityKind::Order, "seller_id"),
        StreamSpec::new("messages-inbound", EntityKind::Message, "recipient_id"),
    ]
}

struct SubscriptionHandle {
    status: HandleStatus,
    guard: SubscriptionGuard,
}

struct ManagerState {
    /// Bumped on every (re)open and on stop. Callbacks and timers capture the
    /// epoch they were created under and bail out on mismatch, so nothing
    /// stale can mutate fresh state.
    epoch: u64,
    connecting: bool,
    user_id: Option<String>,
    handles: HashMap<String, SubscriptionHandle>,
    retry: ReconnectState,
    retry_timer: Option<JoinHandle<()>>,
    timeout_tasks: Vec<JoinHandle<()>>,
}

struct ManagerInner {
    config: RealtimeConfig,
    source: Arc<dyn ChangeEventSource>,
    identity: Arc<dyn IdentityProvider>,
    store: Arc<NotificationStore>,
    translator: EventTranslator,
    streams: Vec<StreamSpec>,
    state: Mutex<ManagerState>,
    connectivity: watch::Sender<Connectivity>,
}

/// Keeps the declared streams subscribed for one user session.
///
/// All lifecycle transitions (connect, event, error, close, timer fire, stop)
/// funnel through methods that serialize on a single state mutex, so the
/// manager behaves as one logical owner regardless of which task a transport
/// callback arrives on. Reconnection is throttled session-wide per the
/// backoff policy in `models::retry`.
///
/// Methods spawn timers and therefore must be called from within a Tokio
/// runtime.
pub struct SubscriptionManager {
    inner: Arc<ManagerInner>,
}

impl SubscriptionManager {
    pub fn new(
        source: Arc<dyn ChangeEventSource>,
        identity: Arc<dyn IdentityProvider>,
        store: Arc<NotificationStore>,
        streams: Vec<StreamSpec>,
        config: RealtimeConfig,
    ) -> Self {
        let (connectivity, _) = watch::channel(Connectivity::Idle);

        Self {
            inner: Arc::new(ManagerInner {
                config,
                source,
                identity,
                store,
                translator: EventTranslator::new(),
                streams,
                state: Mutex::new(ManagerState {
                    epoch: 0,
                    connecting: false,
                    user_id: None,
                    handles: HashMap::new(),
                    retry: ReconnectState::default(),
                    retry_timer: None,
                    timeout_tasks: Vec::new(),
                }),
                connectivity,
            }),
        }
    }

    /// Aggregate connectivity signal for UI consumers.
    pub fn connectivity(&self) -> watch::Receiver<Connectivity> {
        self.inner.connectivity.subscribe()
    }

    pub fn store(&self) -> Arc<NotificationStore> {
        Arc::clone(&self.inner.store)
    }

    /// Opens one handle per declared stream, scoped by the current session
    /// user. Idempotent: a no-op while already connecting or fully connected,
    /// and a no-op without a session user.
    pub fn start(&self) {
        let inner = &self.inner;
        let mut state = inner.state.lock().expect("manager state poisoned");

        if state.connecting {
            debug!("Start ignored, already connecting");
            return;
        }

        if !state.handles.is_empty()
            && state
                .handles
                .values()
                .all(|h| h.status == HandleStatus::Connected)
        {
            debug!("Start ignored, already connected");
            return;
        }

        let user_id = match inner.identity.current_user_id() {
            Some(user_id) => user_id,
            None => {
                debug!("No session user, subscriptions not opened");
                return;
            }
        };

        info!(user_id = %user_id, streams = inner.streams.len(), "Starting subscription manager");
        state.user_id = Some(user_id);
        inner.open_handles(&mut state);
    }

    /// Cancels pending timers, closes all handles, and resets retry state.
    /// Safe to call repeatedly and before `start()`.
    pub fn stop(&self) {
        let inner = &self.inner;
        let mut state = inner.state.lock().expect("manager state poisoned");

        state.epoch += 1;

        if let Some(timer) = state.retry_timer.take() {
            timer.abort();
        }

        for task in state.timeout_tasks.drain(..) {
            task.abort();
        }

        for (stream_id, mut handle) in state.handles.drain() {
            handle.guard.cancel();
            debug!(stream = %stream_id, "Stream subscription cancelled");
        }

        state.connecting = false;
        state.user_id = None;
        state.retry.reset();

        inner.connectivity.send_replace(Connectivity::Idle);
        info!("Subscription manager stopped");
    }

    /// Caller-initiated reset: tears the session down, clears the retry
    /// budget, and starts again. This is the only way back from the
    /// persistent `Disconnected` state.
    pub fn reconnect(&self) {
        info!("Explicit reconnect requested");
        self.stop();
        self.start();
    }
}

impl ManagerInner {
    /// (Re)opens every declared stream under a fresh epoch. Expects
    /// `state.user_id` to be set.
    fn open_handles(self: &Arc<Self>, state: &mut ManagerState) {
        let user_id = match state.user_id.clone() {
            Some(user_id) => user_id,
            None => return,
        };

        state.epoch += 1;
        state.connecting = true;

        for task in state.timeout_tasks.drain(..) {
            task.abort();
        }

        for (_, mut handle) in state.handles.drain() {
            handle.guard.cancel();
        }

        let epoch = state.epoch;

        self.connectivity.send_replace(if state.retry.retry_count == 0 {
            Connectivity::Connecting
        } else {
            Connectivity::Reconnecting
        });

        let connect_timeout = Duration::from_secs(self.config.connect_timeout_secs);

        for spec in &self.streams {
            let filter = EventFilter::new(spec.filter_column.clone(), user_id.clone());
            let callbacks = self.callbacks(epoch, spec.clone());
            let guard = self.source.subscribe(&spec.id, &filter, callbacks);

            state.handles.insert(
                spec.id.clone(),
                SubscriptionHandle {
                    status: HandleStatus::Connecting,
                    guard,
                },
            );

            debug!(stream = %spec.id, epoch, "Stream subscription opened");

            // Transports that silently hang are treated as failed.
            let weak = Arc::downgrade(self);
            let stream_id = spec.id.clone();

            state.timeout_tasks.push(tokio::spawn(async move {
                sleep(connect_timeout).await;

                if let Some(inner) = weak.upgrade() {
                    inner.handle_connect_timeout(epoch, &stream_id);
                }
            }));
        }
    }

    fn callbacks(self: &Arc<Self>, epoch: u64, spec: StreamSpec) -> SourceCallbacks {
        let stream_id = spec.id.clone();

        let on_connected = {
            let weak = Arc::downgrade(self);
            let stream_id = stream_id.clone();

            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.handle_connected(epoch, &stream_id);
                }
            }) as Box<dyn Fn() + Send + Sync>
        };

        let on_event = {
            let weak = Arc::downgrade(self);

            Box::new(move |event: RawChangeEvent| {
                if let Some(inner) = weak.upgrade() {
                    inner.handle_incoming(epoch, &spec, event);
                }
            }) as Box<dyn Fn(RawChangeEvent) + Send + Sync>
        };

        let on_error = {
            let weak = Arc::downgrade(self);
            let stream_id = stream_id.clone();

            Box::new(move |reason: String| {
                if let Some(inner) = weak.upgrade() {
                    inner.handle_failure(epoch, &stream_id, &reason);
                }
            }) as Box<dyn Fn(String) + Send + Sync>
        };

        let on_closed = {
            let weak = Arc::downgrade(self);

            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.handle_closed(epoch, &stream_id);
                }
            }) as Box<dyn Fn() + Send + Sync>
        };

        SourceCallbacks {
            on_connected,
            on_event,
            on_error,
            on_closed,
        }
    }

    fn handle_connected(self: &Arc<Self>, epoch: u64, stream_id: &str) {
        let mut state = self.state.lock().expect("manager state poisoned");

        if state.epoch != epoch {
            debug!(stream = %stream_id, "Stale connected callback, ignoring");
            return;
        }

        match state.handles.get_mut(stream_id) {
            Some(handle) => handle.status = HandleStatus::Connected,
            None => return,
        }

        info!(stream = %stream_id, "Stream connected");

        let all_connected = !state.handles.is_empty()
            && state
                .handles
                .values()
                .all(|h| h.status == HandleStatus::Connected);

        if all_connected {
            state.connecting = false;
            state.retry.reset();
            self.connectivity.send_replace(Connectivity::Connected);
            info!("All streams connected");
        }
    }

    fn handle_incoming(self: &Arc<Self>, epoch: u64, spec: &StreamSpec, event: RawChangeEvent) {
        let user_id = {
            let state = self.state.lock().expect("manager state poisoned");

            if state.epoch != epoch {
                debug!(stream = %spec.id, "Stale event callback, ignoring");
                return;
            }

            match state.user_id.clone() {
                Some(user_id) => user_id,
                None => return,
            }
        };

        if let Some(observer) = &spec.observer {
            observer(&event);
        }

        if !spec.notify {
            return;
        }

        if let Some(notification) = self.translator.translate(&event, &user_id) {
            debug!(
                id = %notification.id,
                kind = %notification.kind,
                stream = %spec.id,
                "Change event translated"
            );
            self.store.insert(notification);
        }
    }

    fn handle_failure(self: &Arc<Self>, epoch: u64, stream_id: &str, reason: &str) {
        let mut state = self.state.lock().expect("manager state poisoned");

        if state.epoch != epoch {
            debug!(stream = %stream_id, "Stale error callback, ignoring");
            return;
        }

        if let Some(handle) = state.handles.get_mut(stream_id) {
            handle.status = HandleStatus::Failed;
        }

        warn!(stream = %stream_id, reason, "Stream failed");
        self.schedule_reconnect(&mut state);
    }

    fn handle_connect_timeout(self: &Arc<Self>, epoch: u64, stream_id: &str) {
        let mut state = self.state.lock().expect("manager state poisoned");

        if state.epoch != epoch {
            return;
        }

        let still_connecting = state
            .handles
            .get(stream_id)
            .map(|h| h.status == HandleStatus::Connecting)
            .unwrap_or(false);

        if !still_connecting {
            return;
        }

        if let Some(handle) = state.handles.get_mut(stream_id) {
            handle.status = HandleStatus::Failed;
        }

        warn!(
            stream = %stream_id,
            timeout_secs = self.config.connect_timeout_secs,
            "Stream did not connect within timeout"
        );
        self.schedule_reconnect(&mut state);
    }

    /// Intentional teardown from the transport side. Never reconnects; the
    /// Closed/Failed distinction is what separates this manager from a naive
    /// auto-retry loop.
    fn handle_closed(self: &Arc<Self>, epoch: u64, stream_id: &str) {
        let mut state = self.state.lock().expect("manager state poisoned");

        if state.epoch != epoch {
            return;
        }

        if let Some(handle) = state.handles.get_mut(stream_id) {
            handle.status = HandleStatus::Closed;
        }

        info!(stream = %stream_id, "Stream closed by transport");
    }

    fn schedule_reconnect(self: &Arc<Self>, state: &mut ManagerState) {
        // One pending timer at a time, however many handles failed.
        if let Some(timer) = &state.retry_timer {
            if !timer.is_finished() {
                debug!("Reconnect already scheduled");
                return;
            }
        }

        match next_attempt(&self.config.retry_config(), &state.retry, Instant::now()) {
            RetryDecision::Stop => {
                state.connecting = false;
                self.connectivity.send_replace(Connectivity::Disconnected);
                warn!(
                    attempts = state.retry.retry_count,
                    "Giving up on automatic reconnection"
                );
            }
            RetryDecision::Retry { delay } | RetryDecision::Wait { remaining: delay } => {
                self.connectivity.send_replace(Connectivity::Reconnecting);

                let epoch = state.epoch;
                let weak = Arc::downgrade(self);

                info!(delay_ms = delay.as_millis() as u64, "Reconnect scheduled");

                state.retry_timer = Some(tokio::spawn(async move {
                    sleep(delay).await;

                    if let Some(inner) = weak.upgrade() {
                        inner.retry_fire(epoch);
                    }
                }));
            }
        }
    }

    fn retry_fire(self: &Arc<Self>, epoch: u64) {
        let mut state = self.state.lock().expect("manager state poisoned");

        if state.epoch != epoch {
            debug!("Stale retry timer, ignoring");
            return;
        }

        state.retry_timer = None;
        state.retry.retry_count += 1;
        state.retry.last_attempt_at = Some(Instant::now());

        info!(attempt = state.retry.retry_count, "Reconnect attempt");
        self.open_handles(&mut state);
    }
}
