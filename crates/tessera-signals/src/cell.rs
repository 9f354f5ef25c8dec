//! ResultCell - the observable holder behind every live signal
//!
//! A `ResultCell<T>` wraps an [`AsyncResult<T>`] in a futures-signals
//! `Mutable` and counts transitions with a version number. The version only
//! moves when state is written, so it doubles as a publish counter:
//! suppressed updates leave it untouched.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::Stream;
use futures_signals::signal::{Mutable, MutableSignalCloned, SignalExt};
use tessera_core::{AsyncResult, SignalError};

/// Shared, observable `AsyncResult<T>`.
pub(crate) struct ResultCell<T> {
    state: Mutable<AsyncResult<T>>,
    version: Arc<AtomicU64>,
}

impl<T> Clone for ResultCell<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            version: self.version.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> ResultCell<T> {
    /// New cell in the pending state.
    pub(crate) fn pending() -> Self {
        Self {
            state: Mutable::new(AsyncResult::Pending),
            version: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current state, cloned.
    pub(crate) fn get(&self) -> AsyncResult<T> {
        self.state.get_cloned()
    }

    /// Number of transitions written so far.
    pub(crate) fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub(crate) fn is_completed(&self) -> bool {
        self.state.lock_ref().is_completed()
    }

    /// Transition to `Completed(value)`.
    pub(crate) fn publish(&self, value: T) {
        self.set(AsyncResult::Completed(value));
    }

    /// Transition to `Error(error)`. Repeating the error already held is a
    /// no-op: no version bump, no notification.
    pub(crate) fn fail(&self, error: SignalError) {
        let mut guard = self.state.lock_mut();
        if matches!(&*guard, AsyncResult::Error(held) if *held == error) {
            return;
        }
        *guard = AsyncResult::Error(error);
        self.version.fetch_add(1, Ordering::Release);
    }

    /// Back to `Pending`. A cell that is already pending is left alone.
    pub(crate) fn reset(&self) {
        if !self.state.lock_ref().is_pending() {
            self.set(AsyncResult::Pending);
        }
    }

    /// Write any state. Observers are notified in the same update.
    pub(crate) fn set(&self, state: AsyncResult<T>) {
        // Bump under the write lock so readers never see a new version with an old value.
        let mut guard = self.state.lock_mut();
        *guard = state;
        self.version.fetch_add(1, Ordering::Release);
    }

    /// Reactive view of the state.
    pub(crate) fn signal(&self) -> MutableSignalCloned<AsyncResult<T>> {
        self.state.signal_cloned()
    }

    /// Fires once for the current state and again after every write, without
    /// cloning the value.
    pub(crate) fn changes(&self) -> impl Stream<Item = ()> + Send + 'static {
        self.state.signal_ref(|_| ()).to_stream()
    }
}
