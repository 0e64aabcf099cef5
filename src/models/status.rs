use std::fmt::{Display, Formatter, Result};

use serde::{Deserialize, Serialize};

/// Lifecycle of a single subscribed stream handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleStatus {
    Idle,
    Connecting,
    Connected,
    Failed,
    Closed,
}

/// Aggregate connectivity of one subscription session.
///
/// `Connected` requires every declared stream handle to be connected.
/// `Reconnecting` means at least one handle failed and an automatic retry is
/// pending. `Disconnected` is persistent: retries are exhausted and only an
/// explicit `reconnect()` (or a fresh `start()`) resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    Idle,
    Connecting,
    Connected,
    Reconnecting,
    Disconnected,
}

impl HandleStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, HandleStatus::Failed | HandleStatus::Closed)
    }
}

impl Display for HandleStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            HandleStatus::Idle => write!(f, "idle"),
            HandleStatus::Connecting => write!(f, "connecting"),
            HandleStatus::Connected => write!(f, "connected"),
            HandleStatus::Failed => write!(f, "failed"),
            HandleStatus::Closed => write!(f, "closed"),
        }
    }
}

impl Display for Connectivity {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Connectivity::Idle => write!(f, "idle"),
            Connectivity::Connecting => write!(f, "connecting"),
            Connectivity::Connected => write!(f, "connected"),
            Connectivity::Reconnecting => write!(f, "reconnecting"),
            Connectivity::Disconnected => write!(f, "disconnected"),
        }
    }
}
