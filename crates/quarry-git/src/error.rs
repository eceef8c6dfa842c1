//! Error types for revision store operations.
//!
//! [`StoreError`] is the single error type returned by all
//! [`RevisionStore`](crate::RevisionStore) trait methods. It uses rich enum
//! variants so callers can match on specific failure modes (missing revision,
//! missing path) without parsing error messages.

use thiserror::Error;

/// Errors returned by [`RevisionStore`](crate::RevisionStore) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A requested revision or ref could not be resolved.
    ///
    /// Indicates a corrupted or unexpectedly shallow repository — fatal for
    /// the current scan when raised during the history walk, but never for
    /// the process.
    #[error("revision not found: {message}")]
    RevisionNotFound {
        /// Human-readable description of what was missing.
        message: String,
    },

    /// A path does not exist inside the requested revision's tree.
    #[error("path not found in revision {revision}: {path}")]
    PathNotFound {
        /// The revision whose tree was searched.
        revision: String,
        /// The path that was missing.
        path: String,
    },

    /// An I/O error occurred reading the underlying store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The underlying git backend returned an unclassified error.
    ///
    /// This is the catch-all for errors that don't fit other variants. The
    /// `message` should include enough context to diagnose the failure.
    #[error("store backend error: {message}")]
    Backend {
        /// Freeform error description from the backend.
        message: String,
    },
}

impl StoreError {
    /// Shorthand for a [`StoreError::Backend`] with a formatted message.
    pub(crate) fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}
