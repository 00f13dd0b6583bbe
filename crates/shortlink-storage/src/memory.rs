use async_trait::async_trait;
use parking_lot::RwLock;
use shortlink_core::storage::{LinkId, LinkStorage, Result};
use shortlink_core::StorageError;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
struct Tables {
    by_id: HashMap<LinkId, String>,
    by_original: HashMap<String, LinkId>,
}

impl Tables {
    fn insert(&mut self, original: &str, id: LinkId) -> Result<()> {
        if self.by_id.contains_key(&id) {
            return Err(StorageError::Conflict(format!("id {} is taken", id)));
        }
        if self.by_original.contains_key(original) {
            return Err(StorageError::Conflict(original.to_string()));
        }

        self.by_id.insert(id, original.to_owned());
        self.by_original.insert(original.to_owned(), id);
        Ok(())
    }
}

/// In-process implementation of [`LinkStorage`].
///
/// Both directions of the mapping sit behind one `RwLock`, so an append
/// observes the count and inserts under the same write guard. Lookups share
/// the read guard.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    tables: RwLock<Tables>,
}

impl InMemoryStorage {
    /// Creates an empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkStorage for InMemoryStorage {
    async fn save(&self, original: &str, id: LinkId) -> Result<()> {
        self.tables.write().insert(original, id)
    }

    async fn load(&self, id: LinkId) -> Result<Option<String>> {
        Ok(self.tables.read().by_id.get(&id).cloned())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.tables.read().by_id.len() as u64)
    }

    async fn exists(&self, original: &str) -> Result<Option<LinkId>> {
        Ok(self.tables.read().by_original.get(original).copied())
    }

    async fn append(&self, original: &str, limit: u64) -> Result<LinkId> {
        let mut tables = self.tables.write();

        if let Some(id) = tables.by_original.get(original) {
            return Ok(*id);
        }

        let id = tables.by_id.len() as LinkId;
        if id >= limit {
            return Err(StorageError::Exhausted(id));
        }
        tables.insert(original, id)?;
        Ok(id)
    }

    async fn shutdown(&self) -> Result<()> {
        debug!(links = self.tables.read().by_id.len(), "in-memory storage shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn save_and_load() {
        let storage = InMemoryStorage::new();

        storage.save("original.com", 0).await.unwrap();

        assert_eq!(
            storage.load(0).await.unwrap().as_deref(),
            Some("original.com")
        );
        assert_eq!(storage.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn load_missing() {
        let storage = InMemoryStorage::new();
        assert_eq!(storage.load(7).await.unwrap(), None);
    }

    #[tokio::test]
    async fn empty_original_is_not_absence() {
        let storage = InMemoryStorage::new();
        storage.save("", 0).await.unwrap();

        assert_eq!(storage.load(0).await.unwrap(), Some(String::new()));
    }

    #[tokio::test]
    async fn exists_checks() {
        let storage = InMemoryStorage::new();
        storage.save("original.com", 0).await.unwrap();

        assert_eq!(storage.exists("not_there.com").await.unwrap(), None);
        assert_eq!(storage.exists("original.com").await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn save_conflicts() {
        let storage = InMemoryStorage::new();
        storage.save("original.com", 0).await.unwrap();

        let same_id = storage.save("other.com", 0).await.unwrap_err();
        assert!(matches!(same_id, StorageError::Conflict(_)));

        let same_original = storage.save("original.com", 1).await.unwrap_err();
        assert!(matches!(same_original, StorageError::Conflict(_)));

        assert_eq!(storage.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn append_assigns_sequential_ids() {
        let storage = InMemoryStorage::new();

        assert_eq!(storage.append("a.com", u64::MAX).await.unwrap(), 0);
        assert_eq!(storage.append("b.com", u64::MAX).await.unwrap(), 1);
        assert_eq!(storage.append("c.com", u64::MAX).await.unwrap(), 2);
        assert_eq!(storage.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn append_returns_existing_id() {
        let storage = InMemoryStorage::new();

        storage.append("a.com", u64::MAX).await.unwrap();
        storage.append("b.com", u64::MAX).await.unwrap();

        assert_eq!(storage.append("a.com", u64::MAX).await.unwrap(), 0);
        assert_eq!(storage.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn append_stops_at_limit() {
        let storage = InMemoryStorage::new();

        assert_eq!(storage.append("a.com", 2).await.unwrap(), 0);
        assert_eq!(storage.append("b.com", 2).await.unwrap(), 1);

        let err = storage.append("c.com", 2).await.unwrap_err();
        assert!(matches!(err, StorageError::Exhausted(2)));
        assert_eq!(storage.exists("c.com").await.unwrap(), None);
        assert_eq!(storage.count().await.unwrap(), 2);

        // Known originals are still answered once the limit is reached.
        assert_eq!(storage.append("a.com", 2).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn concurrent_appends_respect_limit() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut handles = vec![];

        for i in 0..16u64 {
            let storage = Arc::clone(&storage);
            handles.push(tokio::spawn(async move {
                storage.append(&format!("https://example{}.com", i), 4).await
            }));
        }

        let mut stored = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(id) => {
                    assert!(id < 4);
                    stored += 1;
                }
                Err(err) => assert!(matches!(err, StorageError::Exhausted(4))),
            }
        }

        assert_eq!(stored, 4);
        assert_eq!(storage.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn concurrent_appends_get_distinct_ids() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut handles = vec![];

        for i in 0..32u64 {
            let storage = Arc::clone(&storage);
            handles.push(tokio::spawn(async move {
                storage
                    .append(&format!("https://example{}.com", i), u64::MAX)
                    .await
                    .unwrap()
            }));
        }

        let mut ids = vec![];
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();

        assert_eq!(ids, (0..32).collect::<Vec<_>>());
        assert_eq!(storage.count().await.unwrap(), 32);
    }

    #[tokio::test]
    async fn concurrent_appends_of_same_original() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut handles = vec![];

        for _ in 0..16 {
            let storage = Arc::clone(&storage);
            handles.push(tokio::spawn(async move {
                storage.append("https://same.example", u64::MAX).await.unwrap()
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 0);
        }
        assert_eq!(storage.count().await.unwrap(), 1);
    }
}
