use thiserror::Error;

/// Errors related to the core functionality of the link shortener.
pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("link already exists: {0}")]
    Conflict(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
    #[error("id space exhausted at {0} links")]
    Exhausted(u64),
}
