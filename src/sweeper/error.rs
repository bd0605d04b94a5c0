use thiserror::Error;

use crate::store::StoreError;

/// Failure of a whole sweep attempt. Seen by the retry envelope.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Failed to connect to the cluster: {0}")]
    Connection(#[source] StoreError),

    #[error("Failed to list indices for prefix {prefix}: {source}")]
    Enumeration {
        prefix: String,
        #[source]
        source: StoreError,
    },

    #[error("Sweep cancelled")]
    Cancelled,
}

impl SweepError {
    /// Whether another connect + sweep attempt could succeed.
    ///
    /// Connection failures are always retried. Listing failures only when
    /// the store reported a transient condition.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Enumeration { source, .. } => source.is_transient(),
            Self::Cancelled => false,
        }
    }
}

/// Failure to delete a single index. Collected, never propagated.
#[derive(Debug, Error)]
#[error("Failed to delete index {index}: {source}")]
pub struct DeletionError {
    pub index: String,
    #[source]
    pub source: StoreError,
}
