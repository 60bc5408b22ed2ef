use {
    serde::{Deserialize, Serialize},
    std::time::Duration,
};

use crate::{Backoff, Error, Result};

/// Largest batch the Telegram Bot API returns from one `getUpdates` call.
pub const MAX_BATCH_LIMIT: u8 = 100;

/// Tuning for the polling pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollingConfig {
    /// Maximum updates requested per fetch (1..=100).
    pub limit: u8,

    /// Long-poll timeout passed to the remote API, in seconds.
    pub timeout_secs: u32,

    /// Offset of the first fetch. Not persisted; 0 requests the whole
    /// pending backlog.
    pub initial_offset: u64,

    /// Delay after the first consecutive fetch failure (ms).
    pub backoff_initial_ms: u64,

    /// Upper bound for the retry delay (ms).
    pub backoff_max_ms: u64,

    /// Maximum concurrently running handler invocations. 0 means unbounded.
    pub max_in_flight: usize,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            limit: 20,
            timeout_secs: 30,
            initial_offset: 0,
            backoff_initial_ms: 500,
            backoff_max_ms: 30_000,
            max_in_flight: 64,
        }
    }
}

impl PollingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 || self.limit > MAX_BATCH_LIMIT {
            return Err(Error::invalid_config(format!(
                "limit must be between 1 and {MAX_BATCH_LIMIT}, got {}",
                self.limit
            )));
        }
        if self.backoff_initial_ms == 0 {
            return Err(Error::invalid_config("backoff_initial_ms must be positive"));
        }
        if self.backoff_max_ms < self.backoff_initial_ms {
            return Err(Error::invalid_config(format!(
                "backoff_max_ms ({}) is below backoff_initial_ms ({})",
                self.backoff_max_ms, self.backoff_initial_ms
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_millis(self.backoff_initial_ms),
            Duration::from_millis(self.backoff_max_ms),
        )
    }

    /// Handler concurrency cap, `None` when unbounded.
    #[must_use]
    pub fn in_flight_limit(&self) -> Option<usize> {
        (self.max_in_flight > 0).then_some(self.max_in_flight)
    }
}
