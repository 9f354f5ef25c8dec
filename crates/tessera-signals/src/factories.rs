//! Constructors for every live signal variant.
//!
//! All factories are lazy: nothing is fetched or subscribed until the returned
//! signal is first watched. A config that fails [`SignalConfig::validate`]
//! yields a signal that reports the `InvalidConfig` error while observed and
//! never calls the client.

use std::sync::Arc;

use tessera_core::{
    ActionHash, Delete, DeletedLink, EntryType, LedgerClient, Link, LinkQuery, Record,
    SignalConfig, SignalError, SignedAction,
};

use crate::activation::{ActivationController, ActivationHooks};
use crate::cell::ResultCell;
use crate::immutable::ImmutableEngine;
use crate::reconcile::{
    AllRevisions, DeletedLinksReconciler, DeletesForEntry, LatestRevision, LinksReconciler,
    LiveLocalQuery, Reconciler,
};
use crate::signal::LiveSignal;
use crate::sync::SyncEngine;

/// Stands in for an engine when the config is invalid.
struct RejectedConfig<T> {
    label: &'static str,
    cell: ResultCell<T>,
    error: SignalError,
}

impl<T: Clone + Send + Sync + 'static> ActivationHooks for RejectedConfig<T> {
    fn on_activate(&self) {
        tracing::warn!(signal = self.label, error = %self.error, "signal not started");
        self.cell.fail(self.error.clone());
    }

    fn on_deactivate(&self) {
        self.cell.reset();
    }
}

fn rejected<T: Clone + Send + Sync + 'static>(label: &'static str, error: SignalError) -> LiveSignal<T> {
    let cell = ResultCell::pending();
    let hooks = Arc::new(RejectedConfig {
        label,
        cell: cell.clone(),
        error,
    });
    LiveSignal::from_parts(cell, ActivationController::new(label, hooks))
}

/// Poll + push signal over any reconciler.
pub fn synced<C, R>(client: Arc<C>, reconciler: R, config: &SignalConfig) -> LiveSignal<R::Value>
where
    C: LedgerClient,
    R: Reconciler,
{
    if let Err(error) = config.validate() {
        return rejected(reconciler.label(), error);
    }
    let engine = SyncEngine::new(client, reconciler, config);
    let cell = engine.cell().clone();
    let controller = ActivationController::new(engine.label(), engine);
    LiveSignal::from_parts(cell, controller)
}

/// Links of `query.link_type`, updated by link events of that type at any base.
pub fn collection<C: LedgerClient>(
    client: Arc<C>,
    query: LinkQuery,
    config: &SignalConfig,
) -> LiveSignal<Vec<Link>> {
    let reconciler = LinksReconciler::collection(Arc::clone(&client), query);
    synced(client, reconciler, config)
}

/// Links of `query.link_type` at `query.base`. Events match the base in its
/// literal, agent and entry forms.
pub fn live_links<C: LedgerClient>(
    client: Arc<C>,
    query: LinkQuery,
    config: &SignalConfig,
) -> LiveSignal<Vec<Link>> {
    let reconciler = LinksReconciler::at_base(Arc::clone(&client), query);
    synced(client, reconciler, config)
}

/// Deleted links at `query.base`, each with its deletes.
pub fn deleted_links<C: LedgerClient>(
    client: Arc<C>,
    query: LinkQuery,
    config: &SignalConfig,
) -> LiveSignal<Vec<DeletedLink>> {
    let reconciler = DeletedLinksReconciler::new(Arc::clone(&client), query);
    synced(client, reconciler, config)
}

/// A record that never changes. Retries until found, then keeps the value
/// across deactivations.
pub fn immutable_entry<C: LedgerClient>(
    client: Arc<C>,
    action_hash: ActionHash,
    config: &SignalConfig,
) -> LiveSignal<Record<C::Entry>> {
    if let Err(error) = config.validate() {
        return rejected("immutable_entry", error);
    }
    let engine = ImmutableEngine::new(client, action_hash, config);
    let cell = engine.cell().clone();
    let controller = ActivationController::new("immutable_entry", engine);
    LiveSignal::from_parts(cell, controller)
}

pub fn latest_revision<C: LedgerClient>(
    client: Arc<C>,
    original: ActionHash,
    config: &SignalConfig,
) -> LiveSignal<Record<C::Entry>> {
    let reconciler = LatestRevision::new(Arc::clone(&client), original);
    synced(client, reconciler, config)
}

pub fn all_revisions<C: LedgerClient>(
    client: Arc<C>,
    original: ActionHash,
    config: &SignalConfig,
) -> LiveSignal<Vec<Record<C::Entry>>> {
    let reconciler = AllRevisions::new(Arc::clone(&client), original);
    synced(client, reconciler, config)
}

pub fn deletes_for_entry<C: LedgerClient>(
    client: Arc<C>,
    original: ActionHash,
    config: &SignalConfig,
) -> LiveSignal<Vec<SignedAction<Delete>>> {
    let reconciler = DeletesForEntry::new(Arc::clone(&client), original);
    synced(client, reconciler, config)
}

/// Entries of one type on the local source chain.
pub fn live_local_query<C: LedgerClient>(
    client: Arc<C>,
    entry_type: EntryType,
    config: &SignalConfig,
) -> LiveSignal<Vec<Record<C::Entry>>> {
    let reconciler = LiveLocalQuery::new(Arc::clone(&client), entry_type);
    synced(client, reconciler, config)
}
