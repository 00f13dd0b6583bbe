use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Returns the alias of `original`, storing it first if it is new.
    async fn shorten(&self, original: &str) -> Result<String>;

    /// Returns the original URL behind `alias`.
    async fn resolve(&self, alias: &str) -> Result<String>;
}
