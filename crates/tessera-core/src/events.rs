//! Push events delivered by the ledger client.
//!
//! The client hands every subscriber raw JSON values; the stream is shared
//! with application-level notifications that carry no `"type"` tag at all.
//! [`LedgerEvent::decode`] is the single decoding boundary: whatever does not
//! parse into one of the five action-committed shapes is reported as
//! [`SignalError::MalformedEvent`] and dropped by the caller.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SignalError};
use crate::records::{
    CreateLink, Delete, DeleteLink, EntryAction, LinkType, Record, SignedAction,
};

/// An action committed to the ledger, decoded from a push notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LedgerEvent<E> {
    /// An entry was created
    EntryCreated {
        /// The create action
        action: SignedAction<EntryAction>,
        /// Decoded entry payload
        app_entry: E,
    },
    /// An entry received a new revision
    EntryUpdated {
        /// The update action
        action: SignedAction<EntryAction>,
        /// Decoded payload of the new revision
        app_entry: E,
        /// Payload of the replaced revision, when the client includes it
        original_app_entry: Option<E>,
    },
    /// An entry was deleted
    EntryDeleted {
        /// The delete action
        action: SignedAction<Delete>,
        /// Payload of the deleted entry, when the client includes it
        original_app_entry: Option<E>,
    },
    /// A link was created
    LinkCreated {
        /// The create-link action
        action: SignedAction<CreateLink>,
        /// Declared link type
        link_type: LinkType,
    },
    /// A link was deleted
    LinkDeleted {
        /// The delete-link action
        action: SignedAction<DeleteLink>,
        /// The create-link action being deleted
        create_link_action: SignedAction<CreateLink>,
        /// Declared link type
        link_type: LinkType,
    },
}

/// Tag of a [`LedgerEvent`], for logging and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `EntryCreated`
    EntryCreated,
    /// `EntryUpdated`
    EntryUpdated,
    /// `EntryDeleted`
    EntryDeleted,
    /// `LinkCreated`
    LinkCreated,
    /// `LinkDeleted`
    LinkDeleted,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::EntryCreated => "EntryCreated",
            EventKind::EntryUpdated => "EntryUpdated",
            EventKind::EntryDeleted => "EntryDeleted",
            EventKind::LinkCreated => "LinkCreated",
            EventKind::LinkDeleted => "LinkDeleted",
        };
        f.write_str(name)
    }
}

impl<E: DeserializeOwned> LedgerEvent<E> {
    /// Decode a raw notification.
    ///
    /// # Errors
    ///
    /// `SignalError::MalformedEvent` when the value has no recognised `"type"`
    /// tag or its fields do not match the tagged shape.
    pub fn decode(raw: &serde_json::Value) -> Result<Self> {
        if raw.get("type").and_then(serde_json::Value::as_str).is_none() {
            return Err(SignalError::malformed_event("missing \"type\" tag"));
        }
        Ok(Self::deserialize(raw)?)
    }
}

impl<E> LedgerEvent<E> {
    /// Tag of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            LedgerEvent::EntryCreated { .. } => EventKind::EntryCreated,
            LedgerEvent::EntryUpdated { .. } => EventKind::EntryUpdated,
            LedgerEvent::EntryDeleted { .. } => EventKind::EntryDeleted,
            LedgerEvent::LinkCreated { .. } => EventKind::LinkCreated,
            LedgerEvent::LinkDeleted { .. } => EventKind::LinkDeleted,
        }
    }
}

impl<E: Clone> LedgerEvent<E> {
    /// The record written by an `EntryCreated` or `EntryUpdated` event.
    pub fn written_record(&self) -> Option<Record<E>> {
        match self {
            LedgerEvent::EntryCreated { action, app_entry }
            | LedgerEvent::EntryUpdated {
                action, app_entry, ..
            } => Some(Record {
                action: action.clone(),
                entry: app_entry.clone(),
            }),
            _ => None,
        }
    }
}
