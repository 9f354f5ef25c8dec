//! Self-rescheduling poll loop.
//!
//! A poll loop runs one tick immediately, then sleeps for the configured
//! interval (plus optional jitter) after each tick settles and runs the next.
//! Ticks never overlap: a slow fetch pushes the next one back. Dropping the
//! loop aborts its task.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tessera_core::SignalConfig;
use tokio::task::JoinHandle;

/// Whether the loop should schedule another tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PollControl {
    /// Schedule the next tick after the interval
    Continue,
    /// The session is gone; exit the loop
    Stop,
}

/// Delay between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PollSchedule {
    interval: Duration,
    jitter: Duration,
}

impl PollSchedule {
    pub(crate) fn new(interval: Duration, jitter: Duration) -> Self {
        Self { interval, jitter }
    }

    pub(crate) fn from_config(config: &SignalConfig) -> Self {
        Self::new(config.poll_interval(), config.poll_jitter())
    }

    /// Interval plus a uniform draw from `[0, jitter]`.
    pub(crate) fn next_delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.interval;
        }
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        let extra = rand::thread_rng().gen_range(0..=jitter_ms);
        self.interval + Duration::from_millis(extra)
    }
}

/// Running poll task.
pub(crate) struct PollLoop {
    handle: JoinHandle<()>,
}

impl PollLoop {
    /// Spawn the loop. `tick` runs once immediately.
    pub(crate) fn start<F, Fut>(schedule: PollSchedule, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = PollControl> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            loop {
                if tick().await == PollControl::Stop {
                    break;
                }
                tokio::time::sleep(schedule.next_delay()).await;
            }
        });
        Self { handle }
    }
}

impl Drop for PollLoop {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
