//! # Push-Event Reconcilers
//!
//! A reconciler is the query-specific half of a synchronized signal. It knows
//! how to fetch the full value, how to fold one ledger event into the cached
//! value, and when a new value is worth publishing. The sync engine owns
//! everything else: scheduling, subscriptions, session epochs and the cell.
//!
//! Collection reconcilers treat a missing cache as empty, so events that beat
//! the first fetch still land. Scalar reconcilers ignore events until a fetch
//! has produced something to compare against.

mod entries;
mod links;

pub use entries::{AllRevisions, DeletesForEntry, LatestRevision, LiveLocalQuery};
pub use links::{BaseFilter, DeletedLinksReconciler, LinksReconciler};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tessera_core::{LedgerEvent, Result};

/// Query-specific fetch, event folding and publish gate.
#[async_trait]
pub trait Reconciler: Send + Sync + 'static {
    /// Published value; always kept in canonical form.
    type Value: Clone + Send + Sync + 'static;

    /// Entry payload used to decode push events.
    type Entry: DeserializeOwned + Send + Sync + 'static;

    /// Name used in log fields.
    fn label(&self) -> &'static str;

    /// Fetch the full current value.
    async fn fetch(&self) -> Result<Self::Value>;

    /// Fold one event into the cached value.
    ///
    /// Returns `None` when the event does not concern this query.
    fn apply(
        &self,
        cached: Option<&Self::Value>,
        event: &LedgerEvent<Self::Entry>,
    ) -> Option<Self::Value>;

    /// Whether `next` differs materially from what was last published.
    fn should_publish(&self, previous: Option<&Self::Value>, next: &Self::Value) -> bool;
}
