//! Realtime subscription and notification delivery core for the marketplace
//! UI process.
//!
//! The manager keeps long-lived, identity-filtered subscriptions to a
//! change-event stream open for one user session, survives transient
//! transport failures with capped exponential backoff, and turns raw change
//! events into deduplicated, typed notifications fanned out to UI observers
//! (toast surface, badge counters, in-memory history).
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use marketplace_realtime::{
//!     clients::identity::StaticIdentity,
//!     config::RealtimeConfig,
//!     manager::{SubscriptionManager, marketplace_streams},
//!     store::NotificationStore,
//! };
//!
//! # fn demo(source: Arc<dyn marketplace_realtime::clients::source::ChangeEventSource>) {
//! let config = RealtimeConfig::default();
//! let store = Arc::new(NotificationStore::new(config.store_capacity));
//! let manager = SubscriptionManager::new(
//!     source,
//!     Arc::new(StaticIdentity::new("user-1")),
//!     store,
//!     marketplace_streams(),
//!     config,
//! );
//!
//! manager.start();
//! # }
//! ```

pub mod clients;
pub mod config;
pub mod manager;
pub mod models;
pub mod store;
pub mod translator;

pub use config::RealtimeConfig;
pub use manager::{StreamSpec, SubscriptionManager, marketplace_streams};
pub use models::{
    event::{EntityKind, Operation, RawChangeEvent},
    notification::{Notification, NotificationKind},
    status::Connectivity,
};
pub use store::NotificationStore;
pub use translator::EventTranslator;
