use anyhow::{Error, Result};

use crate::models::notification::Notification;

/// Best-effort server-side notification write, for entities this core does
/// not own (cross-device delivery). Failures are logged by the caller and
/// never affect the in-memory store.
pub trait NotificationCreator: Send + Sync {
    fn persist(&self, notification: &Notification) -> Result<(), Error>;
}
