//! # Aggregation Combinator
//!
//! Joins a keyed, changing set of live signals into one signal. While the
//! aggregate is observed it watches every current child; when it goes dormant
//! it lets go of all of them. It never polls or subscribes on its own.
//!
//! The result is pending while any child is pending. Errors are handled per
//! [`ErrorPolicy`].

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use futures::stream::{select_all, StreamExt};
use futures_signals::signal::{Mutable, SignalExt};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tessera_core::AsyncResult;
use tokio::task::JoinHandle;

use crate::activation::{ActivationController, ActivationHooks, SessionEpoch};
use crate::cell::ResultCell;
use crate::signal::{LiveSignal, Observer};

/// What an errored child does to the aggregate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Any child error makes the aggregate an error
    #[default]
    FailFast,
    /// Errored children are left out of the aggregate
    FilterOut,
}

/// Options for [`join_map`] and [`join_list`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinOptions {
    pub errors: ErrorPolicy,
}

impl JoinOptions {
    pub fn filter_out() -> Self {
        Self {
            errors: ErrorPolicy::FilterOut,
        }
    }
}

/// Combine child states.
///
/// Pending wins over everything. Under `FailFast` the first error in key
/// order wins over values. An empty map is completed and empty.
pub fn join_results<K: Ord, T>(
    states: BTreeMap<K, AsyncResult<T>>,
    policy: ErrorPolicy,
) -> AsyncResult<BTreeMap<K, T>> {
    if states.values().any(AsyncResult::is_pending) {
        return AsyncResult::Pending;
    }
    let mut values = BTreeMap::new();
    for (key, state) in states {
        match state {
            AsyncResult::Completed(value) => {
                values.insert(key, value);
            }
            AsyncResult::Error(error) => {
                if policy == ErrorPolicy::FailFast {
                    return AsyncResult::Error(error);
                }
            }
            AsyncResult::Pending => return AsyncResult::Pending,
        }
    }
    AsyncResult::Completed(values)
}

struct JoinSession<T> {
    epoch: SessionEpoch,
    task: Option<JoinHandle<()>>,
    children: Vec<Observer<T>>,
}

struct JoinEngine<K, T, O> {
    me: Weak<Self>,
    source: Mutable<BTreeMap<K, LiveSignal<T>>>,
    policy: ErrorPolicy,
    project: fn(BTreeMap<K, T>) -> O,
    cell: ResultCell<O>,
    session: Mutex<JoinSession<T>>,
}

impl<K, T, O> JoinEngine<K, T, O>
where
    K: Ord + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    O: Clone + Send + Sync + 'static,
{
    fn new(
        source: Mutable<BTreeMap<K, LiveSignal<T>>>,
        options: JoinOptions,
        project: fn(BTreeMap<K, T>) -> O,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            source,
            policy: options.errors,
            project,
            cell: ResultCell::pending(),
            session: Mutex::new(JoinSession {
                epoch: SessionEpoch::default(),
                task: None,
                children: Vec::new(),
            }),
        })
    }

    async fn run(&self, epoch: u64) {
        let mut source_changes = self.source.signal_ref(|_| ()).to_stream().boxed();
        if source_changes.next().await.is_none() {
            return;
        }

        let mut emitted: Option<Vec<(K, Option<u64>)>> = None;
        loop {
            let children: Vec<(K, LiveSignal<T>)> = self
                .source
                .lock_ref()
                .iter()
                .map(|(key, signal)| (key.clone(), signal.clone()))
                .collect();
            let observers: Vec<Observer<T>> =
                children.iter().map(|(_, signal)| signal.watch()).collect();
            if !self.install(epoch, observers) {
                return;
            }
            tracing::debug!(signal = "join", epoch, children = children.len(), "watching children");

            let mut child_changes =
                select_all(children.iter().map(|(_, signal)| signal.cell().changes().boxed()));
            let mut seen: Option<Vec<u64>> = None;
            self.recompute(epoch, &children, &mut seen, &mut emitted);

            let rebuild = loop {
                tokio::select! {
                    change = source_changes.next() => break change.is_some(),
                    Some(()) = child_changes.next() => {
                        self.recompute(epoch, &children, &mut seen, &mut emitted);
                    }
                }
            };
            if !rebuild {
                return;
            }
        }
    }

    /// Swap in the new child observers. The old ones are released after the
    /// new ones attached, so children present in both sets stay active.
    fn install(&self, epoch: u64, observers: Vec<Observer<T>>) -> bool {
        let mut session = self.session.lock();
        if !session.epoch.is_current(epoch) {
            drop(session);
            drop(observers);
            return false;
        }
        let old = std::mem::replace(&mut session.children, observers);
        drop(session);
        drop(old);
        true
    }

    /// Recompute the aggregate from the children's current states.
    ///
    /// `emitted` holds, per key, the child version behind the last completed
    /// aggregate; children left out under `FilterOut` count as `None`. A
    /// recompute with the same contributions writes nothing, and a repeated
    /// error is absorbed by the cell.
    fn recompute(
        &self,
        epoch: u64,
        children: &[(K, LiveSignal<T>)],
        seen: &mut Option<Vec<u64>>,
        emitted: &mut Option<Vec<(K, Option<u64>)>>,
    ) {
        // Versions before values: a write racing this read shows up as a
        // newer version on the next pass.
        let versions: Vec<u64> = children.iter().map(|(_, signal)| signal.version()).collect();
        if seen.as_ref() == Some(&versions) {
            return;
        }
        let states: BTreeMap<K, AsyncResult<T>> = children
            .iter()
            .map(|(key, signal)| (key.clone(), signal.peek()))
            .collect();
        let contributions: Vec<(K, Option<u64>)> = children
            .iter()
            .zip(&versions)
            .map(|((key, _), version)| {
                let errored = states.get(key).is_some_and(AsyncResult::is_error);
                let dropped = errored && self.policy == ErrorPolicy::FilterOut;
                (key.clone(), (!dropped).then_some(*version))
            })
            .collect();
        *seen = Some(versions);

        let next = join_results(states, self.policy).map(self.project);
        let session = self.session.lock();
        if !session.epoch.is_current(epoch) {
            return;
        }
        match next {
            AsyncResult::Pending => {
                *emitted = None;
                self.cell.reset();
            }
            AsyncResult::Error(error) => {
                *emitted = None;
                self.cell.fail(error);
            }
            completed if emitted.as_ref() != Some(&contributions) => {
                *emitted = Some(contributions);
                self.cell.set(completed);
            }
            _ => tracing::trace!(signal = "join", epoch, "aggregate unchanged"),
        }
    }
}

impl<K, T, O> ActivationHooks for JoinEngine<K, T, O>
where
    K: Ord + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    O: Clone + Send + Sync + 'static,
{
    fn on_activate(&self) {
        let mut session = self.session.lock();
        let epoch = session.epoch.begin();
        let engine = self.me.clone();
        session.task = Some(tokio::spawn(async move {
            if let Some(engine) = engine.upgrade() {
                engine.run(epoch).await;
            }
        }));
    }

    fn on_deactivate(&self) {
        let children = {
            let mut session = self.session.lock();
            session.epoch.end();
            if let Some(task) = session.task.take() {
                task.abort();
            }
            std::mem::take(&mut session.children)
        };
        drop(children);
        self.cell.reset();
    }
}

fn build<K, T, O>(
    source: Mutable<BTreeMap<K, LiveSignal<T>>>,
    options: JoinOptions,
    project: fn(BTreeMap<K, T>) -> O,
) -> LiveSignal<O>
where
    K: Ord + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    O: Clone + Send + Sync + 'static,
{
    let engine = JoinEngine::new(source, options, project);
    let cell = engine.cell.clone();
    let controller = ActivationController::new("join", engine);
    LiveSignal::from_parts(cell, controller)
}

/// Join a changing map of signals into one signal of a map.
///
/// Keys added to or removed from `source` while the aggregate is observed are
/// picked up on the next source change.
pub fn join_map<K, T>(
    source: Mutable<BTreeMap<K, LiveSignal<T>>>,
    options: JoinOptions,
) -> LiveSignal<BTreeMap<K, T>>
where
    K: Ord + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    build(source, options, |values| values)
}

/// Join a fixed list of signals, keeping list order. Under `FilterOut`
/// errored entries are skipped.
pub fn join_list<T>(signals: Vec<LiveSignal<T>>, options: JoinOptions) -> LiveSignal<Vec<T>>
where
    T: Clone + Send + Sync + 'static,
{
    let source: BTreeMap<usize, LiveSignal<T>> = signals.into_iter().enumerate().collect();
    build(Mutable::new(source), options, |values| values.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tessera_core::SignalError;

    fn states(entries: Vec<(&'static str, AsyncResult<u32>)>) -> BTreeMap<&'static str, AsyncResult<u32>> {
        entries.into_iter().collect()
    }

    #[test]
    fn test_any_pending_is_pending() {
        let joined = join_results(
            states(vec![
                ("a", AsyncResult::Completed(1)),
                ("b", AsyncResult::Pending),
                ("c", AsyncResult::Error(SignalError::transport("down"))),
            ]),
            ErrorPolicy::FailFast,
        );
        assert!(joined.is_pending());
    }

    #[test]
    fn test_fail_fast_takes_first_error_in_key_order() {
        let joined = join_results(
            states(vec![
                ("z", AsyncResult::Error(SignalError::transport("z"))),
                ("a", AsyncResult::Completed(1)),
                ("m", AsyncResult::Error(SignalError::transport("m"))),
            ]),
            ErrorPolicy::FailFast,
        );
        assert_eq!(joined, AsyncResult::Error(SignalError::transport("m")));
    }

    #[test]
    fn test_filter_out_drops_errors() {
        let joined = join_results(
            states(vec![
                ("a", AsyncResult::Completed(1)),
                ("b", AsyncResult::Error(SignalError::transport("down"))),
            ]),
            ErrorPolicy::FilterOut,
        );
        assert_matches!(joined, AsyncResult::Completed(values) => {
            assert_eq!(values.into_iter().collect::<Vec<_>>(), vec![("a", 1)]);
        });
    }

    #[test]
    fn test_empty_is_completed() {
        let joined = join_results(states(vec![]), ErrorPolicy::FailFast);
        assert_eq!(joined, AsyncResult::Completed(BTreeMap::new()));
    }

    #[test]
    fn test_options_wire_format() {
        let options: JoinOptions = serde_json::from_str(r#"{"errors":"filter_out"}"#).unwrap();
        assert_eq!(options, JoinOptions::filter_out());
        let defaults: JoinOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults.errors, ErrorPolicy::FailFast);
    }
}
