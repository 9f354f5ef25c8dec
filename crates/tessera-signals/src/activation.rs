//! # Activation Controller
//!
//! Reference-counts observers of a signal and turns the zero-to-one and
//! one-to-zero transitions into `on_activate` / `on_deactivate` calls.
//!
//! Observers hold an [`ObserverGuard`]; dropping the last guard deactivates
//! the signal. The count lock is held while a hook runs, so hooks for one
//! controller never interleave and each transition fires exactly once.
//!
//! Hooks must not attach to or detach from their own controller.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Side effects of a signal's synchronization session.
pub(crate) trait ActivationHooks: Send + Sync + 'static {
    /// First observer attached: start a fresh session.
    fn on_activate(&self);

    /// Last observer detached: tear the session down.
    fn on_deactivate(&self);
}

/// Per-signal observer count and the hooks it drives.
pub(crate) struct ActivationController {
    label: &'static str,
    observers: Mutex<usize>,
    hooks: Arc<dyn ActivationHooks>,
}

impl ActivationController {
    pub(crate) fn new(label: &'static str, hooks: Arc<dyn ActivationHooks>) -> Arc<Self> {
        Arc::new(Self {
            label,
            observers: Mutex::new(0),
            hooks,
        })
    }

    /// Register an observer, activating on the first one.
    pub(crate) fn attach(self: &Arc<Self>) -> ObserverGuard {
        let mut observers = self.observers.lock();
        *observers += 1;
        if *observers == 1 {
            tracing::debug!(signal = self.label, "activating");
            self.hooks.on_activate();
        }
        ObserverGuard {
            controller: Arc::clone(self),
        }
    }

    fn detach(&self) {
        let mut observers = self.observers.lock();
        *observers = observers.saturating_sub(1);
        if *observers == 0 {
            tracing::debug!(signal = self.label, "deactivating");
            self.hooks.on_deactivate();
        }
    }

    pub(crate) fn observer_count(&self) -> usize {
        *self.observers.lock()
    }

    pub(crate) fn label(&self) -> &'static str {
        self.label
    }
}

/// Keeps its signal active while alive.
pub(crate) struct ObserverGuard {
    controller: Arc<ActivationController>,
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        self.controller.detach();
    }
}

impl fmt::Debug for ObserverGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverGuard")
            .field("signal", &self.controller.label)
            .finish()
    }
}

/// Monotonic session bookkeeping shared by every engine.
///
/// Each activation opens a new epoch. Callbacks capture the epoch they were
/// started under and must check [`SessionEpoch::is_current`] before writing,
/// which discards late results from a torn-down or replaced session.
#[derive(Debug, Default)]
pub(crate) struct SessionEpoch {
    epoch: u64,
    active: bool,
}

impl SessionEpoch {
    /// Open a fresh session and return its epoch.
    pub(crate) fn begin(&mut self) -> u64 {
        self.epoch = self.epoch.wrapping_add(1);
        self.active = true;
        self.epoch
    }

    /// Close the current session.
    pub(crate) fn end(&mut self) {
        self.active = false;
    }

    pub(crate) fn is_current(&self, epoch: u64) -> bool {
        self.active && self.epoch == epoch
    }
}
