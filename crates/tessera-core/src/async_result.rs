//! Tri-state result exposed by every live signal.

use serde::{Deserialize, Serialize};

use crate::errors::SignalError;

/// Current state of an asynchronously produced value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum AsyncResult<T> {
    /// No value yet
    Pending,
    /// The value is available
    Completed(T),
    /// Producing the value failed
    Error(SignalError),
}

impl<T> Default for AsyncResult<T> {
    fn default() -> Self {
        AsyncResult::Pending
    }
}

impl<T> AsyncResult<T> {
    /// True while no value or error has been produced.
    pub fn is_pending(&self) -> bool {
        matches!(self, AsyncResult::Pending)
    }

    /// True when a value is available.
    pub fn is_completed(&self) -> bool {
        matches!(self, AsyncResult::Completed(_))
    }

    /// True when producing the value failed.
    pub fn is_error(&self) -> bool {
        matches!(self, AsyncResult::Error(_))
    }

    /// Borrow the completed value.
    pub fn value(&self) -> Option<&T> {
        match self {
            AsyncResult::Completed(value) => Some(value),
            _ => None,
        }
    }

    /// Borrow the error cause.
    pub fn error(&self) -> Option<&SignalError> {
        match self {
            AsyncResult::Error(error) => Some(error),
            _ => None,
        }
    }

    /// Transform the completed value, keeping pending and error as they are.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> AsyncResult<U> {
        match self {
            AsyncResult::Pending => AsyncResult::Pending,
            AsyncResult::Completed(value) => AsyncResult::Completed(f(value)),
            AsyncResult::Error(error) => AsyncResult::Error(error),
        }
    }

    /// Convert a settled result into a `Result`; `None` while pending.
    pub fn into_result(self) -> Option<Result<T, SignalError>> {
        match self {
            AsyncResult::Pending => None,
            AsyncResult::Completed(value) => Some(Ok(value)),
            AsyncResult::Error(error) => Some(Err(error)),
        }
    }
}

impl<T> From<Result<T, SignalError>> for AsyncResult<T> {
    fn from(result: Result<T, SignalError>) -> Self {
        match result {
            Ok(value) => AsyncResult::Completed(value),
            Err(error) => AsyncResult::Error(error),
        }
    }
}
