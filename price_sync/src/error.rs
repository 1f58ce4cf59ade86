//! Persistence errors shared by the ingestion pipeline and the export query.

use thiserror::Error;

/// Failures reported by the price store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A read-only query failed; no partial result is returned.
    #[error("error querying database: {0}")]
    Query(#[source] diesel::result::Error),

    /// A step inside the ingestion transaction failed and the whole batch was rolled back.
    #[error("transaction rolled back: {0}")]
    Transaction(#[source] diesel::result::Error),
}

/// Result type used by the store-facing operations.
pub type StoreResult<T> = Result<T, StoreError>;
