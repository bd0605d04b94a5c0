use thiserror::Error;

/// Errors returned by an index store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unreachable: {0}")]
    Unreachable(String),

    #[error("Store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response from store: {0}")]
    Decode(String),

    #[error("Deletion of index {0} was not acknowledged")]
    NotAcknowledged(String),

    #[error("Invalid store endpoint: {0}")]
    InvalidEndpoint(String),
}

impl StoreError {
    /// Whether retrying the same request may succeed.
    ///
    /// Transport failures, server errors and rate limiting are transient.
    /// Client errors, malformed responses and bad endpoints are not.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Unreachable(_) => true,
            StoreError::Status { status, .. } => *status >= 500 || *status == 429,
            StoreError::Decode(_)
            | StoreError::NotAcknowledged(_)
            | StoreError::InvalidEndpoint(_) => false,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            StoreError::Status {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            StoreError::Unreachable(err.to_string())
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
