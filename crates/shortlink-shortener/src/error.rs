use shortlink_core::{CoreError, StorageError};
use thiserror::Error;
use tonic::{Code, Status};

pub type Result<T> = std::result::Result<T, ShortenerError>;

#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid alias: {0}")]
    InvalidAlias(String),
    #[error("no link stored for alias: {0}")]
    NotFound(String),
    #[error("alias space exhausted after {0} links")]
    CapacityExhausted(u64),
    #[error("invalid settings: {0}")]
    Settings(
        #[from]
        #[source]
        CoreError,
    ),
    #[error("storage error: {0}")]
    Storage(
        #[from]
        #[source]
        StorageError,
    ),
}

impl ShortenerError {
    /// Whether the error is caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ShortenerError::InvalidUrl(_)
                | ShortenerError::InvalidAlias(_)
                | ShortenerError::NotFound(_)
        )
    }
}

impl From<ShortenerError> for Status {
    fn from(error: ShortenerError) -> Self {
        match error {
            ShortenerError::InvalidUrl(_) => Status::new(Code::InvalidArgument, "not a url"),
            ShortenerError::InvalidAlias(_) => {
                Status::new(Code::InvalidArgument, "invalid alias format")
            }
            ShortenerError::NotFound(_) => Status::new(Code::NotFound, "link not found"),
            ShortenerError::CapacityExhausted(_)
            | ShortenerError::Settings(_)
            | ShortenerError::Storage(_) => Status::new(Code::Internal, "internal error"),
        }
    }
}
