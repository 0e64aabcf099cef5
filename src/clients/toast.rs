use crate::models::notification::NotificationKind;

/// Transient toast surface. Fire-and-forget: invoked by the store on every
/// successful insert, never part of the store's durable state.
pub trait ToastPresenter: Send + Sync {
    fn show(&self, kind: NotificationKind, title: &str, body: &str);
}
