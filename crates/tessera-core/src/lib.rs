//! Tessera Core - ledger model for live signals
//!
//! This crate holds the vocabulary shared by the signal engines and by ledger
//! client implementations. It contains no scheduling or reactive machinery.
//!
//! # Contents
//!
//! - [`LedgerHash`]: opaque content address with re-typing between address spaces
//! - [`Record`], [`Link`], [`DeletedLink`], [`SignedAction`]: decoded ledger items
//! - [`LedgerEvent`]: typed push notification, decoded once at the boundary
//! - [`LedgerClient`]: the request/response + subscribe contract signals consume
//! - [`AsyncResult`]: the tri-state value every signal exposes
//! - [`SignalError`]: unified error taxonomy
//! - [`SignalConfig`]: poll and retry tunables

#![forbid(unsafe_code)]

/// Tri-state async result
pub mod async_result;

/// Ledger client contract
pub mod client;

/// Poll and retry configuration
pub mod config;

/// Unified error handling
pub mod errors;

/// Typed push events
pub mod events;

/// Content-addressed identifiers
pub mod hash;

/// Records, actions and links
pub mod records;

pub use async_result::AsyncResult;
pub use client::{EventHandler, EventSubscription, LedgerClient, LinkQuery};
pub use config::SignalConfig;
pub use errors::{Result, SignalError};
pub use events::{EventKind, LedgerEvent};
pub use hash::{ActionHash, AgentPubKey, AnyLinkableHash, EntryHash, HashKind, LedgerHash};
pub use records::{
    Create, CreateLink, Delete, DeleteLink, DeletedLink, EntryAction, EntryType, Identified,
    Link, LinkType, Record, SignedAction, Timestamp, Update,
};
