//! Tessera Signals - live, self-synchronizing views over a replicated ledger
//!
//! A [`LiveSignal`] holds an [`AsyncResult`] for one ledger query and keeps it
//! current while somebody watches it. Activation is lazy and reference
//! counted: the first [`Observer`] starts a poll loop and a push subscription,
//! dropping the last one stops both and resets the signal to pending.
//!
//! # Architecture
//!
//! ```text
//! factories ──► SyncEngine ◄── Reconciler (fetch, apply, should_publish)
//!     │             │
//!     │             ├── PollLoop     fetch now, sleep, repeat
//!     │             ├── subscription push events, decoded once
//!     │             └── ResultCell   observable AsyncResult + version
//!     └──────► ImmutableEngine ── RetryPolicy (fixed interval, fixed budget)
//!
//! join_map / join_list ──► JoinEngine: watches children, no I/O of its own
//! ```
//!
//! Both the poll and the push path go through one publish gate, so a value
//! that arrives twice is published once.
//!
//! # Example
//!
//! ```rust,ignore
//! let config = SignalConfig::default();
//! let comments = live_links(client.clone(), LinkQuery::new(post, LinkType::new("PostToComments")), &config);
//!
//! let observer = comments.watch();
//! let mut states = observer.changes();
//! while let Some(state) = states.next().await {
//!     render(state);
//! }
//! ```

#![forbid(unsafe_code)]

mod activation;
mod cell;
mod change;
mod immutable;
mod poll;
mod retry;
mod sync;

#[cfg(test)]
mod test_support;

/// Signal constructors
pub mod factories;

/// Aggregation over many signals
pub mod join;

/// Query-specific fetch and event folding
pub mod reconcile;

/// Signal and observer handles
pub mod signal;

pub use factories::{
    all_revisions, collection, deleted_links, deletes_for_entry, immutable_entry,
    latest_revision, live_links, live_local_query, synced,
};
pub use join::{join_list, join_map, join_results, ErrorPolicy, JoinOptions};
pub use reconcile::{BaseFilter, Reconciler};
pub use signal::{LiveSignal, Observer};

pub use tessera_core::{AsyncResult, SignalConfig, SignalError};
