//! Unified error type for Tessera signals
//!
//! A single flat enum covers every failure a live signal can observe. Signals
//! carry it inside `AsyncResult::Error`, so it must stay `Clone`.

use serde::{Deserialize, Serialize};

use crate::hash::ActionHash;

/// Unified error type for all Tessera operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum SignalError {
    /// The requested ledger entity does not exist (yet)
    #[error("Not found: {message}")]
    NotFound {
        /// What was looked up
        message: String,
    },

    /// Several concurrent updates to the same entity were observed
    #[error("Conflicting updates for {original}: {count} concurrent revisions")]
    ConflictingUpdates {
        /// The entity that was updated concurrently
        original: ActionHash,
        /// Number of competing revisions
        count: usize,
    },

    /// The ledger client failed to complete a call
    #[error("Transport error: {message}")]
    Transport {
        /// Error message from the client
        message: String,
    },

    /// A push event did not decode into any known event shape
    #[error("Malformed event: {message}")]
    MalformedEvent {
        /// Decoder message
        message: String,
    },

    /// Configuration rejected by validation
    #[error("Invalid config: {message}")]
    InvalidConfig {
        /// Which field failed and why
        message: String,
    },
}

impl SignalError {
    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a conflicting updates error
    pub fn conflicting_updates(original: ActionHash, count: usize) -> Self {
        Self::ConflictingUpdates { original, count }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a malformed event error
    pub fn malformed_event(message: impl Into<String>) -> Self {
        Self::MalformedEvent {
            message: message.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether this error means the entity is missing rather than unreachable.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Standard Result type for Tessera operations
pub type Result<T> = std::result::Result<T, SignalError>;

impl From<serde_json::Error> for SignalError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed_event(err.to_string())
    }
}

impl From<toml::de::Error> for SignalError {
    fn from(err: toml::de::Error) -> Self {
        Self::invalid_config(err.to_string())
    }
}
