//! Ledger client contract consumed by live signals.
//!
//! Signals never talk to the network themselves. They issue the typed lookups
//! below and subscribe to the client's notification stream; the client owns
//! transport, wire decoding and the entry payload type.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::hash::{ActionHash, AnyLinkableHash};
use crate::records::{Delete, DeletedLink, EntryType, Link, LinkType, Record, SignedAction};

/// Callback invoked for every raw notification the client receives.
pub type EventHandler = Arc<dyn Fn(&serde_json::Value) + Send + Sync>;

/// Links of one type hanging off one base.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkQuery {
    /// Base address the links start from
    pub base: AnyLinkableHash,
    /// Declared link type
    pub link_type: LinkType,
}

impl LinkQuery {
    /// Create a link query.
    pub fn new(base: AnyLinkableHash, link_type: LinkType) -> Self {
        Self { base, link_type }
    }
}

/// Handle to a notification subscription.
///
/// Delivery stops when [`EventSubscription::unsubscribe`] is called or the
/// handle is dropped, whichever happens first.
pub struct EventSubscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl EventSubscription {
    /// Wrap the client's teardown closure.
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Stop delivery now.
    pub fn unsubscribe(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.run();
    }
}

impl fmt::Debug for EventSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSubscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

/// Request/response plus notification interface to the ledger.
///
/// Lookups that may legitimately find nothing return `Ok(None)` or an empty
/// collection; `Err` is reserved for transport failures and for
/// collaborator-detected conflicts such as `SignalError::ConflictingUpdates`.
#[async_trait]
pub trait LedgerClient: Send + Sync + 'static {
    /// Decoded application entry payload.
    type Entry: Clone + Send + Sync + DeserializeOwned + 'static;

    /// Fetch one record by action hash.
    async fn get_record(&self, action_hash: &ActionHash) -> Result<Option<Record<Self::Entry>>>;

    /// Fetch the latest revision of the entry created by `original`.
    async fn get_latest_revision(
        &self,
        original: &ActionHash,
    ) -> Result<Option<Record<Self::Entry>>>;

    /// Fetch every revision of the entry created by `original`, including the create.
    async fn get_all_revisions(&self, original: &ActionHash) -> Result<Vec<Record<Self::Entry>>>;

    /// Fetch every delete targeting `original`.
    async fn get_deletes(&self, original: &ActionHash) -> Result<Vec<SignedAction<Delete>>>;

    /// Fetch live links.
    async fn get_links(&self, query: &LinkQuery) -> Result<Vec<Link>>;

    /// Fetch deleted links with their deletes.
    async fn get_deleted_links(&self, query: &LinkQuery) -> Result<Vec<DeletedLink>>;

    /// Query the local source chain for entries of one type.
    async fn query_local(&self, entry_type: &EntryType) -> Result<Vec<Record<Self::Entry>>>;

    /// Subscribe to raw notifications.
    fn subscribe(&self, handler: EventHandler) -> EventSubscription;
}
