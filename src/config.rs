use anyhow::{Error, Result, anyhow};
use dotenvy::dotenv;
use serde::Deserialize;

use crate::models::retry::RetryConfig;

/// Tunables for one subscription session. Loadable from `REALTIME_`-prefixed
/// environment variables; every field has a default so embedding hosts can
/// also rely on `RealtimeConfig::default()`.
#[derive(Clone, Deserialize, Debug)]
pub struct RealtimeConfig {
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,

    #[serde(default = "default_base_retry_delay_ms")]
    pub base_retry_delay_ms: u64,

    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,

    #[serde(default = "default_min_retry_interval_ms")]
    pub min_retry_interval_ms: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_store_capacity")]
    pub store_capacity: usize,
}

fn default_max_retry_attempts() -> u32 {
    3
}

fn default_base_retry_delay_ms() -> u64 {
    1_000
}

fn default_max_retry_delay_ms() -> u64 {
    30_000
}

fn default_min_retry_interval_ms() -> u64 {
    5_000
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_store_capacity() -> usize {
    50
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            max_retry_attempts: default_max_retry_attempts(),
            base_retry_delay_ms: default_base_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
            min_retry_interval_ms: default_min_retry_interval_ms(),
            connect_timeout_secs: default_connect_timeout_secs(),
            store_capacity: default_store_capacity(),
        }
    }
}

impl RealtimeConfig {
    pub fn load() -> Result<Self, Error> {
        dotenv().ok();

        let config = envy::prefixed("REALTIME_")
            .from_env::<Self>()
            .map_err(|_| anyhow!("Invalid realtime environment variable"))?;
        Ok(config)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_retry_attempts,
            base_delay_ms: self.base_retry_delay_ms,
            max_delay_ms: self.max_retry_delay_ms,
            min_interval_ms: self.min_retry_interval_ms,
        }
    }
}
