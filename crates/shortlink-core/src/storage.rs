use crate::error::StorageError;
use async_trait::async_trait;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Zero-based sequential identifier of a stored link.
pub type LinkId = u64;

/// Persistence contract the link service depends on.
///
/// Ids are zero-based and dense from the service's point of view; backends
/// that number rows differently translate at their own boundary.
#[async_trait]
pub trait LinkStorage: Send + Sync + 'static {
    /// Stores `original` under `id`.
    ///
    /// Returns `Err(Conflict)` if either the id or the original is taken.
    async fn save(&self, original: &str, id: LinkId) -> Result<()>;

    /// Retrieves the original stored under `id`.
    ///
    /// Returns `None` if nothing is stored there. A stored empty string is
    /// returned as `Some("")`.
    async fn load(&self, id: LinkId) -> Result<Option<String>>;

    /// Number of committed records.
    async fn count(&self) -> Result<u64>;

    /// Returns the id of `original` if it is stored.
    async fn exists(&self, original: &str) -> Result<Option<LinkId>>;

    /// Atomically assigns the next id (the current count) to `original` and
    /// stores it.
    ///
    /// If `original` is already stored, its existing id is returned and
    /// nothing is written. Concurrent calls never hand out the same id.
    ///
    /// Returns `Err(Exhausted)` without writing when the next id would be
    /// `limit` or more.
    async fn append(&self, original: &str, limit: u64) -> Result<LinkId>;

    /// Releases the underlying resources.
    async fn shutdown(&self) -> Result<()>;
}
