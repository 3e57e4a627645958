//! Error types for metabatch
//!
//! This module defines the error hierarchy for the batch engine:
//! - Enumeration errors (bad root directory)
//! - Pool lifecycle errors (submission after shutdown)
//! - Batch lifecycle errors (overlapping batches)
//! - Configuration and CLI errors
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Infrastructure errors propagate synchronously to the caller
//! - Per-item failures are data, not errors: they are captured into a
//!   `TaskOutcome` and counted, never raised across the task boundary

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the metabatch library
#[derive(Error, Debug)]
pub enum BatchError {
    /// Work enumeration failed (bad root directory)
    #[error("enumeration error: {0}")]
    Enumeration(#[from] EnumerationError),

    /// Worker pool errors
    #[error("pool error: {0}")]
    Pool(#[from] PoolError),

    /// A batch is already running; the in-flight batch is unaffected
    #[error("a batch is already in progress")]
    BatchInProgress,

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors discovering work items under a root directory
#[derive(Error, Debug)]
pub enum EnumerationError {
    /// Root directory does not exist
    #[error("root directory not found: '{path}'")]
    NotFound { path: PathBuf },

    /// Root path exists but is not a directory
    #[error("root path is not a directory: '{path}'")]
    NotADirectory { path: PathBuf },

    /// Root directory could not be read
    #[error("cannot read root directory '{path}': {reason}")]
    Unreadable { path: PathBuf, reason: String },
}

/// Worker pool lifecycle errors
#[derive(Error, Debug)]
pub enum PoolError {
    /// Submission after shutdown began
    #[error("worker pool is closed - no new tasks accepted")]
    Closed,

    /// Worker thread could not be spawned
    #[error("failed to spawn worker {id}: {reason}")]
    SpawnFailed { id: usize, reason: String },
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Empty extension allow-list
    #[error("extension allow-list is empty: no file would ever match")]
    EmptyExtensionList,

    /// Generator endpoint missing or malformed
    #[error("invalid generator endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

/// Why a single work item failed
///
/// Carried inside `TaskOutcome::Failure`. These are recorded and counted;
/// they never abort sibling work or the batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The generation collaborator failed or returned no metadata
    #[error("metadata generation failed: {0}")]
    Generate(String),

    /// The writing collaborator failed
    #[error("metadata write failed: {0}")]
    Write(String),

    /// A fault escaped a collaborator (e.g. a panic), captured at the
    /// task boundary
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

/// Result type alias for BatchError
pub type Result<T> = std::result::Result<T, BatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let enum_err = EnumerationError::NotFound {
            path: "/missing".into(),
        };
        let batch_err: BatchError = enum_err.into();
        assert!(matches!(batch_err, BatchError::Enumeration(_)));

        let pool_err: BatchError = PoolError::Closed.into();
        assert!(matches!(pool_err, BatchError::Pool(PoolError::Closed)));
    }

    #[test]
    fn test_failure_reason_display() {
        let reason = FailureReason::Generate("connection refused".into());
        assert_eq!(
            reason.to_string(),
            "metadata generation failed: connection refused"
        );
    }
}
