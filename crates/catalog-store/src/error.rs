use catalog_core::WalkError;
use thiserror::Error;

/// Errors surfaced by `CatalogStore` operations, distinguished per the
/// error kinds a caller needs to act on (HTTP status mapping, retry,
/// logging level).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("catalog not found")]
    NotFound,

    #[error("permission denied: {0}")]
    Permission(#[source] std::io::Error),

    #[error("invalid catalog name {0:?}")]
    InvalidName(String),

    #[error("walking input: {0}")]
    InputWalk(#[from] WalkError),

    #[error("operation cancelled")]
    Cancelled,

    #[error("decoding index: {0}")]
    IndexDecode(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}; {1}")]
    Joined(Box<StoreError>, Box<StoreError>),
}

impl StoreError {
    /// Wraps an I/O error, classifying permission failures distinctly so
    /// callers can tell "not found" from "not allowed" from "broken".
    pub fn from_io(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => StoreError::NotFound,
            std::io::ErrorKind::PermissionDenied => StoreError::Permission(err),
            _ => StoreError::Io(err),
        }
    }

    /// Joins two results from concurrent subtasks, keeping whichever
    /// error(s) occurred. Two errors are joined (both observed), not
    /// masked; a single error propagates alone; two successes yield `Ok`.
    pub fn join(a: Result<(), StoreError>, b: Result<(), StoreError>) -> Result<(), StoreError> {
        match (a, b) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Err(e1), Err(e2)) => Err(StoreError::Joined(Box::new(e1), Box::new(e2))),
        }
    }
}
