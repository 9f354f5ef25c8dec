//! Tunables shared by every live signal.
//!
//! Config is plain data: it can be built in code, taken from `Default`, or
//! parsed from a TOML table such as
//!
//! ```toml
//! poll_interval_ms = 20000
//! poll_jitter_ms = 500
//! retry_interval_ms = 1000
//! retry_budget = 4
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SignalError};

/// Default poll interval for mutable and collection signals.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 20_000;
/// Default spacing between immutable-entry fetch attempts.
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 1_000;
/// Default number of immutable-entry fetch attempts.
pub const DEFAULT_RETRY_BUDGET: u32 = 4;

/// Poll and retry configuration for live signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Delay between the end of one fetch and the start of the next
    pub poll_interval_ms: u64,
    /// Upper bound of uniform random jitter added to each poll delay
    pub poll_jitter_ms: u64,
    /// Delay between immutable-entry fetch attempts
    pub retry_interval_ms: u64,
    /// Total immutable-entry fetch attempts before giving up
    pub retry_budget: u32,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            poll_jitter_ms: 0,
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
            retry_budget: DEFAULT_RETRY_BUDGET,
        }
    }
}

impl SignalConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: SignalConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = duration_ms(interval);
        self
    }

    /// Set the poll jitter bound
    pub fn with_poll_jitter(mut self, jitter: Duration) -> Self {
        self.poll_jitter_ms = duration_ms(jitter);
        self
    }

    /// Set the retry interval
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval_ms = duration_ms(interval);
        self
    }

    /// Set the retry budget
    pub fn with_retry_budget(mut self, budget: u32) -> Self {
        self.retry_budget = budget;
        self
    }

    /// Poll interval as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Poll jitter bound as a `Duration`.
    pub fn poll_jitter(&self) -> Duration {
        Duration::from_millis(self.poll_jitter_ms)
    }

    /// Retry interval as a `Duration`.
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    /// Reject values that would make signals spin or never fetch.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(SignalError::invalid_config(
                "Field 'poll_interval_ms' must be at least 1 (got 0)",
            ));
        }
        if self.retry_interval_ms == 0 {
            return Err(SignalError::invalid_config(
                "Field 'retry_interval_ms' must be at least 1 (got 0)",
            ));
        }
        if self.retry_budget == 0 {
            return Err(SignalError::invalid_config(
                "Field 'retry_budget' must be at least 1 (got 0)",
            ));
        }
        Ok(())
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
