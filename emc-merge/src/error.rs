//! Error types for emc-merge
//!
//! Two classes stop a run: a broken input schema and a violated programmer
//! invariant. Data-quality conflicts are never errors; they become flags and
//! audit records. External-service failures are [`ResolverError`]s and are
//! absorbed by the resolver as misses.

use thiserror::Error;

/// Merge engine error type
#[derive(Debug, Error)]
pub enum MergeError {
    /// Required input column absent or a field of the wrong type
    #[error("Schema error: {0}")]
    Schema(String),

    /// A stage received data that an earlier stage guarantees cannot occur
    #[error("Invariant violated: {0}")]
    Invariant(String),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// emc-common error
    #[error("Common error: {0}")]
    Common(#[from] emc_common::Error),
}

/// Result type alias for merge engine operations
pub type MergeResult<T> = Result<T, MergeError>;

/// External name / coordinate resolver errors
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Resolver returned HTTP {0}: {1}")]
    Status(u16, String),

    #[error("Malformed resolver response: {0}")]
    Malformed(String),
}
