//! Entry, revision and deletion reconcilers.

use std::sync::Arc;

use async_trait::async_trait;
use tessera_core::{
    ActionHash, Delete, EntryType, LedgerClient, LedgerEvent, Record, Result, SignalError,
    SignedAction,
};

use super::Reconciler;
use crate::change::{canonicalize, collection_changed, scalar_changed};

/// Latest revision of one entry.
pub struct LatestRevision<C> {
    client: Arc<C>,
    original: ActionHash,
}

impl<C: LedgerClient> LatestRevision<C> {
    pub fn new(client: Arc<C>, original: ActionHash) -> Self {
        Self { client, original }
    }
}

#[async_trait]
impl<C: LedgerClient> Reconciler for LatestRevision<C> {
    type Value = Record<C::Entry>;
    type Entry = C::Entry;

    fn label(&self) -> &'static str {
        "latest_revision"
    }

    async fn fetch(&self) -> Result<Record<C::Entry>> {
        self.client
            .get_latest_revision(&self.original)
            .await?
            .ok_or_else(|| SignalError::not_found(format!("no revision of {}", self.original)))
    }

    fn apply(
        &self,
        cached: Option<&Record<C::Entry>>,
        event: &LedgerEvent<C::Entry>,
    ) -> Option<Record<C::Entry>> {
        let LedgerEvent::EntryUpdated { action, .. } = event else {
            return None;
        };
        let cached = cached?;
        if action.content.replaces() != Some(cached.action_hash()) {
            return None;
        }
        event.written_record()
    }

    fn should_publish(
        &self,
        previous: Option<&Record<C::Entry>>,
        next: &Record<C::Entry>,
    ) -> bool {
        scalar_changed(previous, next)
    }
}

/// Every revision of one entry, the create included.
pub struct AllRevisions<C> {
    client: Arc<C>,
    original: ActionHash,
}

impl<C: LedgerClient> AllRevisions<C> {
    pub fn new(client: Arc<C>, original: ActionHash) -> Self {
        Self { client, original }
    }
}

#[async_trait]
impl<C: LedgerClient> Reconciler for AllRevisions<C> {
    type Value = Vec<Record<C::Entry>>;
    type Entry = C::Entry;

    fn label(&self) -> &'static str {
        "all_revisions"
    }

    async fn fetch(&self) -> Result<Vec<Record<C::Entry>>> {
        let revisions = self.client.get_all_revisions(&self.original).await?;
        if revisions.is_empty() {
            return Err(SignalError::not_found(format!(
                "no revisions of {}",
                self.original
            )));
        }
        Ok(canonicalize(revisions))
    }

    fn apply(
        &self,
        cached: Option<&Vec<Record<C::Entry>>>,
        event: &LedgerEvent<C::Entry>,
    ) -> Option<Vec<Record<C::Entry>>> {
        let LedgerEvent::EntryUpdated { action, .. } = event else {
            return None;
        };
        let replaces = action.content.replaces()?;
        let known = *replaces == self.original
            || cached.map_or(false, |revisions| {
                revisions.iter().any(|r| r.action_hash() == replaces)
            });
        if !known {
            return None;
        }
        let mut revisions = cached.cloned().unwrap_or_default();
        revisions.extend(event.written_record());
        Some(canonicalize(revisions))
    }

    fn should_publish(
        &self,
        previous: Option<&Vec<Record<C::Entry>>>,
        next: &Vec<Record<C::Entry>>,
    ) -> bool {
        collection_changed(previous.map(Vec::as_slice), next)
    }
}

/// Deletes targeting one entry.
pub struct DeletesForEntry<C> {
    client: Arc<C>,
    original: ActionHash,
}

impl<C: LedgerClient> DeletesForEntry<C> {
    pub fn new(client: Arc<C>, original: ActionHash) -> Self {
        Self { client, original }
    }
}

#[async_trait]
impl<C: LedgerClient> Reconciler for DeletesForEntry<C> {
    type Value = Vec<SignedAction<Delete>>;
    type Entry = C::Entry;

    fn label(&self) -> &'static str {
        "deletes_for_entry"
    }

    async fn fetch(&self) -> Result<Vec<SignedAction<Delete>>> {
        let deletes = self.client.get_deletes(&self.original).await?;
        Ok(canonicalize(deletes))
    }

    fn apply(
        &self,
        cached: Option<&Vec<SignedAction<Delete>>>,
        event: &LedgerEvent<C::Entry>,
    ) -> Option<Vec<SignedAction<Delete>>> {
        let LedgerEvent::EntryDeleted { action, .. } = event else {
            return None;
        };
        if action.content.deletes_address != self.original {
            return None;
        }
        let mut deletes = cached.cloned().unwrap_or_default();
        deletes.push(action.clone());
        Some(canonicalize(deletes))
    }

    fn should_publish(
        &self,
        previous: Option<&Vec<SignedAction<Delete>>>,
        next: &Vec<SignedAction<Delete>>,
    ) -> bool {
        collection_changed(previous.map(Vec::as_slice), next)
    }
}

/// Local source-chain entries of one type, kept current by create, update
/// and delete events.
pub struct LiveLocalQuery<C> {
    client: Arc<C>,
    entry_type: EntryType,
}

impl<C: LedgerClient> LiveLocalQuery<C> {
    pub fn new(client: Arc<C>, entry_type: EntryType) -> Self {
        Self { client, entry_type }
    }
}

#[async_trait]
impl<C: LedgerClient> Reconciler for LiveLocalQuery<C> {
    type Value = Vec<Record<C::Entry>>;
    type Entry = C::Entry;

    fn label(&self) -> &'static str {
        "live_local_query"
    }

    async fn fetch(&self) -> Result<Vec<Record<C::Entry>>> {
        let records = self.client.query_local(&self.entry_type).await?;
        Ok(canonicalize(records))
    }

    fn apply(
        &self,
        cached: Option<&Vec<Record<C::Entry>>>,
        event: &LedgerEvent<C::Entry>,
    ) -> Option<Vec<Record<C::Entry>>> {
        let mut records = cached.cloned().unwrap_or_default();
        match event {
            LedgerEvent::EntryCreated { action, .. } => {
                if *action.content.entry_type() != self.entry_type {
                    return None;
                }
                records.extend(event.written_record());
            }
            LedgerEvent::EntryUpdated { action, .. } => {
                let replaces = action.content.replaces()?;
                let position = records.iter().position(|r| r.action_hash() == replaces)?;
                records.remove(position);
                records.extend(event.written_record());
            }
            LedgerEvent::EntryDeleted { action, .. } => {
                let target = &action.content.deletes_address;
                let position = records.iter().position(|r| r.action_hash() == target)?;
                records.remove(position);
            }
            _ => return None,
        }
        Some(canonicalize(records))
    }

    fn should_publish(
        &self,
        previous: Option<&Vec<Record<C::Entry>>>,
        next: &Vec<Record<C::Entry>>,
    ) -> bool {
        collection_changed(previous.map(Vec::as_slice), next)
    }
}
