//! Content-addressed ledger identifiers
//!
//! Every item a signal caches is identified by a [`LedgerHash`]. The hash is
//! opaque to the signal layer: it is only compared, ordered and, for link
//! bases, re-typed between address spaces.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Address space a hash belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashKind {
    /// Hash of a signed action
    Action,
    /// Hash of an entry payload
    Entry,
    /// Public key of an agent
    Agent,
    /// Address outside the ledger
    External,
}

impl HashKind {
    fn prefix(self) -> &'static str {
        match self {
            HashKind::Action => "uhCkk",
            HashKind::Entry => "uhCEk",
            HashKind::Agent => "uhCAk",
            HashKind::External => "uhC8k",
        }
    }
}

/// Opaque content address of a ledger item.
///
/// Ordering is `(kind, core)`, which gives canonical ordering a deterministic
/// tie-breaker.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LedgerHash {
    kind: HashKind,
    core: [u8; 32],
}

/// Hash of a signed action.
pub type ActionHash = LedgerHash;
/// Hash of an entry payload.
pub type EntryHash = LedgerHash;
/// Agent public key.
pub type AgentPubKey = LedgerHash;
/// Any hash that can serve as a link base or target.
pub type AnyLinkableHash = LedgerHash;

impl LedgerHash {
    /// Build a hash from its kind and 32 core bytes.
    pub const fn new(kind: HashKind, core: [u8; 32]) -> Self {
        Self { kind, core }
    }

    /// Address space of this hash.
    pub fn kind(&self) -> HashKind {
        self.kind
    }

    /// Core bytes, identical across re-typings.
    pub fn core(&self) -> &[u8; 32] {
        &self.core
    }

    /// Same core bytes viewed in another address space.
    ///
    /// An agent's public key and the entry holding it share core bytes, so a
    /// link base written under one kind can be matched under the other.
    pub fn retype(&self, kind: HashKind) -> Self {
        Self {
            kind,
            core: self.core,
        }
    }
}

impl fmt::Display for LedgerHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), URL_SAFE_NO_PAD.encode(self.core))
    }
}

impl fmt::Debug for LedgerHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = self.to_string();
        let short = encoded.get(..12).unwrap_or(&encoded);
        write!(f, "LedgerHash({short}…)")
    }
}
