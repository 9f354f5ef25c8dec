//! # Immutable Entry Engine
//!
//! Resolves a record that can never change once written. Lookups retry at a
//! fixed interval until the record shows up or the budget runs out. A resolved
//! record is kept for the life of the signal: later activations republish it
//! without touching the network, and deactivation does not reset it.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tessera_core::{ActionHash, LedgerClient, Record, SignalConfig, SignalError};
use tokio::task::JoinHandle;

use crate::activation::{ActivationHooks, SessionEpoch};
use crate::cell::ResultCell;
use crate::retry::RetryPolicy;

struct ImmutableSession<E> {
    epoch: SessionEpoch,
    resolved: Option<Record<E>>,
    task: Option<JoinHandle<()>>,
}

pub(crate) struct ImmutableEngine<C: LedgerClient> {
    me: Weak<Self>,
    client: Arc<C>,
    action_hash: ActionHash,
    policy: RetryPolicy,
    cell: ResultCell<Record<C::Entry>>,
    session: Mutex<ImmutableSession<C::Entry>>,
}

impl<C: LedgerClient> ImmutableEngine<C> {
    pub(crate) fn new(client: Arc<C>, action_hash: ActionHash, config: &SignalConfig) -> Arc<Self> {
        let policy = RetryPolicy::from_config(config);
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            client,
            action_hash,
            policy,
            cell: ResultCell::pending(),
            session: Mutex::new(ImmutableSession {
                epoch: SessionEpoch::default(),
                resolved: None,
                task: None,
            }),
        })
    }

    pub(crate) fn cell(&self) -> &ResultCell<Record<C::Entry>> {
        &self.cell
    }

    async fn resolve(&self, epoch: u64) {
        let action_hash = self.action_hash;
        let outcome = self
            .policy
            .execute_with_context(|attempt| {
                let client = Arc::clone(&self.client);
                async move {
                    tracing::trace!(signal = "immutable_entry", attempt, "fetching record");
                    client.get_record(&action_hash).await?.ok_or_else(|| {
                        SignalError::not_found(format!("record {action_hash} not found"))
                    })
                }
            })
            .await;

        let mut session = self.session.lock();
        if !session.epoch.is_current(epoch) {
            return;
        }
        session.task = None;
        match outcome.result {
            Ok(record) => {
                tracing::debug!(
                    signal = "immutable_entry",
                    epoch,
                    attempts = outcome.attempts,
                    "record resolved"
                );
                session.resolved = Some(record.clone());
                self.cell.publish(record);
            }
            Err(error) => {
                tracing::warn!(
                    signal = "immutable_entry",
                    epoch,
                    attempts = outcome.attempts,
                    error = %error,
                    "giving up on record"
                );
                self.cell.fail(error);
            }
        }
    }
}

impl<C: LedgerClient> ActivationHooks for ImmutableEngine<C> {
    fn on_activate(&self) {
        let mut session = self.session.lock();
        let epoch = session.epoch.begin();

        if let Some(record) = &session.resolved {
            if !self.cell.is_completed() {
                self.cell.publish(record.clone());
            }
            return;
        }

        let engine = self.me.clone();
        session.task = Some(tokio::spawn(async move {
            if let Some(engine) = engine.upgrade() {
                engine.resolve(epoch).await;
            }
        }));
    }

    fn on_deactivate(&self) {
        let mut session = self.session.lock();
        session.epoch.end();
        if let Some(task) = session.task.take() {
            task.abort();
        }
        if session.resolved.is_none() {
            self.cell.reset();
        }
    }
}
