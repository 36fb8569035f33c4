//! Error types

mod fetch;

pub use fetch::*;

use crate::selection::BulkOperation;

/// Errors returned by the page cache, the navigator and the synchronizer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Fetching a page failed. Previously held state is left untouched.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// A bulk operation is already running.
    #[error("cannot start {requested}: {active} is already in progress")]
    OperationInProgress {
        /// The operation currently holding the bulk slot.
        active: BulkOperation,
        /// The operation that was rejected.
        requested: BulkOperation,
    },

    /// An argument was out of range (page index 0, count 0, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Creates a new invalid argument error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Returns the underlying fetch error, if any.
    pub fn as_fetch(&self) -> Option<&FetchError> {
        match self {
            Self::Fetch(e) => Some(e),
            _ => None,
        }
    }

    /// Returns `true` if this error was caused by a bulk operation already running.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::OperationInProgress { .. })
    }
}
