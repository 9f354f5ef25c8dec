//! # Bounded Retry
//!
//! Fixed-interval, fixed-budget retry for entities that are expected to show
//! up eventually (an immutable record that has not gossiped to this node yet).
//! The budget counts total attempts, the first one included.

use std::future::Future;
use std::time::Duration;

use tessera_core::{Result, SignalConfig, SignalError};

/// Retry configuration for the immutable fetch path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    /// Total attempts, never below 1
    pub max_attempts: u32,
    /// Pause between attempts
    pub interval: Duration,
}

impl RetryPolicy {
    pub(crate) fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }

    pub(crate) fn from_config(config: &SignalConfig) -> Self {
        Self::fixed(config.retry_interval(), config.retry_budget)
    }

    /// Not-found and transport failures are worth another attempt; anything
    /// else the collaborator reported is final.
    pub(crate) fn is_retryable(error: &SignalError) -> bool {
        matches!(
            error,
            SignalError::NotFound { .. } | SignalError::Transport { .. }
        )
    }

    /// Run `operation` until it succeeds, fails permanently or the budget runs out.
    ///
    /// `operation` receives the 1-based attempt number.
    pub(crate) async fn execute_with_context<F, Fut, T>(&self, mut operation: F) -> RetryOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => {
                    return RetryOutcome {
                        result: Ok(value),
                        attempts: attempt,
                    };
                }
                Err(error) => {
                    if attempt >= self.max_attempts || !Self::is_retryable(&error) {
                        return RetryOutcome {
                            result: Err(error),
                            attempts: attempt,
                        };
                    }
                    tracing::trace!(
                        attempt,
                        interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "retrying"
                    );
                    tokio::time::sleep(self.interval).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Final result plus how many attempts it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RetryOutcome<T> {
    pub result: Result<T>,
    pub attempts: u32,
}
