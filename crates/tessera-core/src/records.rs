//! Ledger records, actions and links as seen by live signals.
//!
//! These are the decoded shapes the ledger client hands back from fetches and
//! push events. Only the fields signals need for matching and ordering are
//! modelled; everything else stays in the application entry payload `E`.

use serde::{Deserialize, Serialize};

use crate::hash::{ActionHash, AgentPubKey, AnyLinkableHash, EntryHash};

/// Logical timestamp of an action, in microseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

/// Declared type tag of a link.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinkType(pub String);

impl LinkType {
    /// Create a link type tag.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Declared application type of an entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryType(pub String);

impl EntryType {
    /// Create an entry type tag.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// An action together with its hash, author and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedAction<A> {
    /// Hash of the action
    pub hash: ActionHash,
    /// Agent that authored the action
    pub author: AgentPubKey,
    /// When the action was authored
    pub timestamp: Timestamp,
    /// Action payload
    pub content: A,
}

/// Creation of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Create {
    /// Application type of the created entry
    pub entry_type: EntryType,
    /// Hash of the created entry
    pub entry_hash: EntryHash,
}

/// A new revision of an existing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    /// The revision this update replaces
    pub original_action_address: ActionHash,
    /// Entry of the replaced revision
    pub original_entry_address: EntryHash,
    /// Application type of the new entry
    pub entry_type: EntryType,
    /// Hash of the new entry
    pub entry_hash: EntryHash,
}

/// Any action that writes an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryAction {
    /// Original creation
    Create(Create),
    /// Later revision
    Update(Update),
}

impl EntryAction {
    /// Application type of the written entry.
    pub fn entry_type(&self) -> &EntryType {
        match self {
            EntryAction::Create(create) => &create.entry_type,
            EntryAction::Update(update) => &update.entry_type,
        }
    }

    /// The revision replaced by this action, if it is an update.
    pub fn replaces(&self) -> Option<&ActionHash> {
        match self {
            EntryAction::Create(_) => None,
            EntryAction::Update(update) => Some(&update.original_action_address),
        }
    }
}

/// Deletion of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delete {
    /// Action being deleted
    pub deletes_address: ActionHash,
    /// Entry being deleted
    pub deletes_entry_address: EntryHash,
}

/// Creation of a link from a base to a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLink {
    /// Link base
    pub base_address: AnyLinkableHash,
    /// Link target
    pub target_address: AnyLinkableHash,
    /// Declared link type
    pub link_type: LinkType,
    /// Opaque link tag
    #[serde(default)]
    pub tag: Vec<u8>,
}

/// Deletion of a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteLink {
    /// Base of the deleted link
    pub base_address: AnyLinkableHash,
    /// The create-link action being deleted
    pub link_add_address: ActionHash,
}

/// A committed entry and its authoring action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record<E> {
    /// The create or update action
    pub action: SignedAction<EntryAction>,
    /// Decoded application entry
    pub entry: E,
}

impl<E> Record<E> {
    /// Hash of the authoring action.
    pub fn action_hash(&self) -> &ActionHash {
        &self.action.hash
    }
}

/// A live link, flattened from its create-link action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Hash of the create-link action
    pub create_link_hash: ActionHash,
    /// Agent that created the link
    pub author: AgentPubKey,
    /// Link base
    pub base: AnyLinkableHash,
    /// Link target
    pub target: AnyLinkableHash,
    /// When the link was created
    pub timestamp: Timestamp,
    /// Declared link type
    pub link_type: LinkType,
    /// Opaque link tag
    pub tag: Vec<u8>,
}

impl From<&SignedAction<CreateLink>> for Link {
    fn from(action: &SignedAction<CreateLink>) -> Self {
        Self {
            create_link_hash: action.hash,
            author: action.author,
            base: action.content.base_address,
            target: action.content.target_address,
            timestamp: action.timestamp,
            link_type: action.content.link_type.clone(),
            tag: action.content.tag.clone(),
        }
    }
}

/// A link that has been deleted at least once, with every delete seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedLink {
    /// The original create-link action
    pub create: SignedAction<CreateLink>,
    /// Every delete-link action targeting it
    pub deletes: Vec<SignedAction<DeleteLink>>,
}

/// Anything a signal caches: it has an identity and a logical timestamp.
pub trait Identified {
    /// Content address used for equality and dedup.
    fn identity(&self) -> &ActionHash;

    /// Logical time used for canonical ordering.
    fn timestamp(&self) -> Timestamp;
}

impl<A> Identified for SignedAction<A> {
    fn identity(&self) -> &ActionHash {
        &self.hash
    }

    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

impl<E> Identified for Record<E> {
    fn identity(&self) -> &ActionHash {
        &self.action.hash
    }

    fn timestamp(&self) -> Timestamp {
        self.action.timestamp
    }
}

impl Identified for Link {
    fn identity(&self) -> &ActionHash {
        &self.create_link_hash
    }

    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

impl Identified for DeletedLink {
    fn identity(&self) -> &ActionHash {
        &self.create.hash
    }

    fn timestamp(&self) -> Timestamp {
        self.create.timestamp
    }
}
