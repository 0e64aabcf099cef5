use tokio::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub min_interval_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            min_interval_ms: 5_000,
        }
    }
}

/// Reconnection bookkeeping for one subscription session. Kept per manager,
/// not per handle: reconnects are throttled globally for the session.
#[derive(Debug, Clone, Default)]
pub struct ReconnectState {
    /// Retry attempts already issued since the last fully successful connect.
    pub retry_count: u32,
    pub last_attempt_at: Option<Instant>,
}

impl ReconnectState {
    /// Reset on a fully successful (re)connection of all handles, or on an
    /// explicit caller-initiated `reconnect()`.
    pub fn reset(&mut self) {
        self.retry_count = 0;
        self.last_attempt_at = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Schedule the next attempt after `delay`.
    Retry { delay: Duration },
    /// An attempt was issued too recently; wait out the remaining interval
    /// instead of issuing another one.
    Wait { remaining: Duration },
    /// Retries exhausted; surface a persistent disconnected state.
    Stop,
}

/// Pure backoff decision. All state mutation happens in the caller.
///
/// The delay grows exponentially from `base_delay_ms`, capped at
/// `max_delay_ms`. Two attempts are never issued within `min_interval_ms` of
/// each other, which keeps multiple per-handle failure callbacks from fanning
/// out into a reconnect storm.
pub fn next_attempt(config: &RetryConfig, state: &ReconnectState, now: Instant) -> RetryDecision {
    if state.retry_count >= config.max_attempts {
        return RetryDecision::Stop;
    }

    if let Some(last) = state.last_attempt_at {
        let since_last = now.saturating_duration_since(last);
        let min_interval = Duration::from_millis(config.min_interval_ms);

        if since_last < min_interval {
            return RetryDecision::Wait {
                remaining: min_interval - since_last,
            };
        }
    }

    // Shift capped well below 64 so the multiply cannot overflow.
    let exponent = state.retry_count.min(16);
    let delay_ms = config
        .base_delay_ms
        .saturating_mul(1u64 << exponent)
        .min(config.max_delay_ms);

    RetryDecision::Retry {
        delay: Duration::from_millis(delay_ms),
    }
}
