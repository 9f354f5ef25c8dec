//! # Live Signals
//!
//! [`LiveSignal`] is the handle consumers hold. It is cheap to clone; clones
//! share state and observer count. Synchronization runs only while at least
//! one [`Observer`] from [`LiveSignal::watch`] is alive.
//!
//! Watching spawns tokio tasks, so the first `watch()` must happen inside a
//! tokio runtime.

use std::fmt;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use futures_signals::signal::{MutableSignalCloned, SignalExt};
use tessera_core::{AsyncResult, Result, SignalError};

use crate::activation::{ActivationController, ObserverGuard};
use crate::cell::ResultCell;

/// Observable, self-synchronizing `AsyncResult<T>`.
pub struct LiveSignal<T> {
    cell: ResultCell<T>,
    controller: Arc<ActivationController>,
}

impl<T> Clone for LiveSignal<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            controller: Arc::clone(&self.controller),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> LiveSignal<T> {
    pub(crate) fn from_parts(cell: ResultCell<T>, controller: Arc<ActivationController>) -> Self {
        Self { cell, controller }
    }

    /// Start observing. The first observer activates the signal.
    pub fn watch(&self) -> Observer<T> {
        let guard = self.controller.attach();
        Observer {
            cell: self.cell.clone(),
            guard,
        }
    }

    /// Current state, without observing.
    pub fn peek(&self) -> AsyncResult<T> {
        self.cell.get()
    }

    pub fn observer_count(&self) -> usize {
        self.controller.observer_count()
    }

    pub fn is_active(&self) -> bool {
        self.observer_count() > 0
    }

    /// Number of state transitions published so far.
    pub fn version(&self) -> u64 {
        self.cell.version()
    }

    /// Observe until the signal leaves `Pending`, then return that state.
    ///
    /// The temporary observer is dropped on return, so a signal nobody else
    /// watches goes dormant again.
    pub async fn settled(&self) -> Result<T> {
        let observer = self.watch();
        let mut states = observer.changes();
        while let Some(state) = states.next().await {
            if let Some(result) = state.into_result() {
                return result;
            }
        }
        Err(SignalError::transport(format!(
            "{} signal closed before settling",
            self.controller.label()
        )))
    }

    pub(crate) fn cell(&self) -> &ResultCell<T> {
        &self.cell
    }
}

impl<T> fmt::Debug for LiveSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveSignal")
            .field("signal", &self.controller.label())
            .field("observers", &self.controller.observer_count())
            .finish()
    }
}

/// Keeps a signal active. Dropping the last one deactivates it.
pub struct Observer<T> {
    cell: ResultCell<T>,
    guard: ObserverGuard,
}

impl<T: Clone + Send + Sync + 'static> Observer<T> {
    pub fn get(&self) -> AsyncResult<T> {
        self.cell.get()
    }

    /// futures-signals view of the state.
    pub fn signal(&self) -> MutableSignalCloned<AsyncResult<T>> {
        self.cell.signal()
    }

    /// Stream of states, starting with the current one. Intermediate states
    /// may be skipped if the consumer falls behind.
    pub fn changes(&self) -> impl Stream<Item = AsyncResult<T>> + Send + 'static {
        self.cell.signal().to_stream()
    }

    pub fn version(&self) -> u64 {
        self.cell.version()
    }
}

impl<T> fmt::Debug for Observer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer").field("guard", &self.guard).finish()
    }
}
