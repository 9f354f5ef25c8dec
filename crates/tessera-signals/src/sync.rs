//! # Sync Engine
//!
//! Drives one mutable or collection signal: while observed it polls the
//! reconciler's fetch on a self-rescheduling loop and folds push events into
//! the cached value. Both paths meet in [`SyncEngine::offer`], under the same
//! session lock, so the published value does not depend on which one wins.
//!
//! ## Session lifecycle
//!
//! - activate: open a new epoch, clear the accumulator, start polling, subscribe
//! - deactivate: close the epoch, stop polling, unsubscribe, reset to pending
//!
//! Every write re-checks the epoch it was started under. Results that arrive
//! after deactivation, or after a re-activation opened a newer epoch, are
//! dropped. The session lock is never held across a fetch or a call into the
//! client.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tessera_core::{EventHandler, EventSubscription, LedgerClient, LedgerEvent, SignalConfig};

use crate::activation::{ActivationHooks, SessionEpoch};
use crate::cell::ResultCell;
use crate::poll::{PollControl, PollLoop, PollSchedule};
use crate::reconcile::Reconciler;

/// Mutable state owned by one engine. The accumulator always holds the last
/// published value of the current session.
struct SessionState<V> {
    epoch: SessionEpoch,
    cached: Option<V>,
    poll: Option<PollLoop>,
    subscription: Option<EventSubscription>,
}

impl<V> Default for SessionState<V> {
    fn default() -> Self {
        Self {
            epoch: SessionEpoch::default(),
            cached: None,
            poll: None,
            subscription: None,
        }
    }
}

pub(crate) struct SyncEngine<C, R: Reconciler> {
    me: Weak<Self>,
    client: Arc<C>,
    reconciler: R,
    cell: ResultCell<R::Value>,
    schedule: PollSchedule,
    session: Mutex<SessionState<R::Value>>,
}

impl<C: LedgerClient, R: Reconciler> SyncEngine<C, R> {
    pub(crate) fn new(client: Arc<C>, reconciler: R, config: &SignalConfig) -> Arc<Self> {
        let schedule = PollSchedule::from_config(config);
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            client,
            reconciler,
            cell: ResultCell::pending(),
            schedule,
            session: Mutex::new(SessionState::default()),
        })
    }

    pub(crate) fn cell(&self) -> &ResultCell<R::Value> {
        &self.cell
    }

    pub(crate) fn label(&self) -> &'static str {
        self.reconciler.label()
    }

    async fn poll_once(&self, epoch: u64) -> PollControl {
        if !self.session.lock().epoch.is_current(epoch) {
            return PollControl::Stop;
        }

        let fetched = self.reconciler.fetch().await;

        let mut session = self.session.lock();
        if !session.epoch.is_current(epoch) {
            tracing::trace!(signal = self.label(), epoch, "discarding stale fetch");
            return PollControl::Stop;
        }
        match fetched {
            Ok(value) => self.offer(&mut session, value, "poll"),
            Err(error) => {
                tracing::warn!(signal = self.label(), epoch, error = %error, "fetch failed");
                self.cell.fail(error);
            }
        }
        PollControl::Continue
    }

    fn handle_event(&self, epoch: u64, raw: &serde_json::Value) {
        let event = match LedgerEvent::<R::Entry>::decode(raw) {
            Ok(event) => event,
            Err(error) => {
                tracing::trace!(signal = self.label(), error = %error, "ignoring event");
                return;
            }
        };

        let mut session = self.session.lock();
        if !session.epoch.is_current(epoch) {
            return;
        }
        match self.reconciler.apply(session.cached.as_ref(), &event) {
            Some(next) => self.offer(&mut session, next, "push"),
            None => {
                tracing::trace!(signal = self.label(), kind = %event.kind(), "event not relevant");
            }
        }
    }

    /// Publish gate shared by the poll and push paths.
    fn offer(&self, session: &mut SessionState<R::Value>, value: R::Value, source: &'static str) {
        let publish = !self.cell.is_completed()
            || self
                .reconciler
                .should_publish(session.cached.as_ref(), &value);
        if !publish {
            tracing::trace!(signal = self.label(), source, "unchanged");
            return;
        }
        tracing::debug!(signal = self.label(), source, "publishing");
        session.cached = Some(value.clone());
        self.cell.publish(value);
    }

    fn event_handler(&self, epoch: u64) -> EventHandler {
        let engine = self.me.clone();
        Arc::new(move |raw: &serde_json::Value| {
            if let Some(engine) = engine.upgrade() {
                engine.handle_event(epoch, raw);
            }
        })
    }
}

impl<C: LedgerClient, R: Reconciler> ActivationHooks for SyncEngine<C, R> {
    fn on_activate(&self) {
        let epoch = {
            let mut session = self.session.lock();
            session.cached = None;
            session.epoch.begin()
        };
        tracing::debug!(signal = self.label(), epoch, "session started");

        let engine = self.me.clone();
        let poll = PollLoop::start(self.schedule, move || {
            let engine = engine.clone();
            async move {
                match engine.upgrade() {
                    Some(engine) => engine.poll_once(epoch).await,
                    None => PollControl::Stop,
                }
            }
        });
        let subscription = self.client.subscribe(self.event_handler(epoch));

        {
            let mut session = self.session.lock();
            if session.epoch.is_current(epoch) {
                session.poll = Some(poll);
                session.subscription = Some(subscription);
                return;
            }
        }
        // Superseded while subscribing.
        drop(poll);
        subscription.unsubscribe();
    }

    fn on_deactivate(&self) {
        let (poll, subscription) = {
            let mut session = self.session.lock();
            session.epoch.end();
            session.cached = None;
            (session.poll.take(), session.subscription.take())
        };
        drop(poll);
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }
        self.cell.reset();
        tracing::debug!(signal = self.label(), "session ended");
    }
}
