//! Scan-level error type.
//!
//! Per-candidate failures never surface here — they are isolated inside the
//! worker pool so one bad commit cannot abort the remaining history walk.
//! [`ScanError`] covers only the failures that end a whole repository scan:
//! an unreadable store, a broken configuration, or a sink that stopped
//! accepting output. No error is retried; retries belong to the external
//! orchestration layer.

use thiserror::Error;

use quarry_git::StoreError;

use crate::config::ConfigError;

/// A repository scan failed as a whole.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The revision store is unreadable or corrupted.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The output sink failed to accept a record.
    #[error("output sink failed: {0}")]
    Sink(#[from] std::io::Error),
}
