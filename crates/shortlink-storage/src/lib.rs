//! Storage backends for the shortlink service.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStorage;
pub use postgres::PostgresStorage;
pub use shortlink_core::storage::{LinkId, LinkStorage, Result};
pub use shortlink_core::StorageError;
