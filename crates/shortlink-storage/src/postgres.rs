use async_trait::async_trait;
use shortlink_core::storage::{LinkId, LinkStorage, Result};
use shortlink_core::StorageError;
use sqlx::postgres::{PgConnectOptions, PgPool};
use sqlx::Row;
use tracing::debug;

/// Schema of the `urls` table.
pub const URLS_DDL: &str = include_str!("../ddl/postgres/urls.sql");

/// PostgreSQL implementation of the storage contract.
///
/// Rows live in a single `urls` table whose primary key starts at 1. The
/// service's ids start at 0, so every id is shifted by one on the way in and
/// out of this type and nowhere else.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Creates a storage from an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a storage by opening a new connection pool from options.
    pub async fn connect_with(options: PgConnectOptions) -> Result<Self> {
        let pool = PgPool::connect_with(options)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `urls` table if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(URLS_DDL)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn to_row_id(id: LinkId) -> Result<i64> {
    i64::try_from(id)
        .ok()
        .and_then(|id| id.checked_add(1))
        .ok_or_else(|| StorageError::InvalidData(format!("id {} is out of range", id)))
}

fn from_row_id(row_id: i64) -> Result<LinkId> {
    row_id
        .checked_sub(1)
        .and_then(|id| LinkId::try_from(id).ok())
        .ok_or_else(|| StorageError::InvalidData(format!("invalid row id {}", row_id)))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn map_insert_error(err: sqlx::Error, original: &str) -> StorageError {
    if is_unique_violation(&err) {
        StorageError::Conflict(original.to_string())
    } else {
        map_sqlx_error(err)
    }
}

#[async_trait]
impl LinkStorage for PostgresStorage {
    async fn save(&self, original: &str, id: LinkId) -> Result<()> {
        sqlx::query("INSERT INTO urls (id, original) VALUES ($1, $2)")
            .bind(to_row_id(id)?)
            .bind(original)
            .execute(&self.pool)
            .await
            .map_err(|err| map_insert_error(err, original))?;
        Ok(())
    }

    async fn load(&self, id: LinkId) -> Result<Option<String>> {
        // Ids past the BIGINT key range cannot be stored.
        let Ok(row_id) = to_row_id(id) else {
            return Ok(None);
        };

        let row = sqlx::query("SELECT original FROM urls WHERE id = $1")
            .bind(row_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(|row| row.try_get::<String, _>("original").map_err(map_sqlx_error))
            .transpose()
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM urls")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        u64::try_from(count)
            .map_err(|_| StorageError::InvalidData(format!("negative row count {}", count)))
    }

    async fn exists(&self, original: &str) -> Result<Option<LinkId>> {
        let row_id: Option<i64> = sqlx::query_scalar("SELECT id FROM urls WHERE original = $1")
            .bind(original)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row_id.map(from_row_id).transpose()
    }

    async fn append(&self, original: &str, limit: u64) -> Result<LinkId> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        // Serializes appends against each other while leaving reads alone.
        sqlx::query("LOCK TABLE urls IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM urls WHERE original = $1")
            .bind(original)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        if let Some(row_id) = existing {
            debug!(row_id, "original already stored");
            return from_row_id(row_id);
        }

        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM urls")
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        let next = u64::try_from(count)
            .map_err(|_| StorageError::InvalidData(format!("negative row count {}", count)))?;
        if next >= limit {
            debug!(count = next, limit, "id space exhausted");
            return Err(StorageError::Exhausted(next));
        }
        let row_id = count
            .checked_add(1)
            .ok_or_else(|| StorageError::InvalidData(format!("row count {} overflows", count)))?;

        sqlx::query("INSERT INTO urls (id, original) VALUES ($1, $2)")
            .bind(row_id)
            .bind(original)
            .execute(&mut *tx)
            .await
            .map_err(|err| map_insert_error(err, original))?;

        tx.commit().await.map_err(map_sqlx_error)?;

        debug!(row_id, "appended link");
        from_row_id(row_id)
    }

    async fn shutdown(&self) -> Result<()> {
        self.pool.close().await;
        debug!("postgres pool closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_ids_are_offset_by_one() {
        assert_eq!(to_row_id(0).unwrap(), 1);
        assert_eq!(to_row_id(41).unwrap(), 42);
        assert_eq!(from_row_id(1).unwrap(), 0);
        assert_eq!(from_row_id(42).unwrap(), 41);
    }

    #[test]
    fn out_of_range_ids() {
        assert!(to_row_id(u64::MAX).is_err());
        assert!(to_row_id(i64::MAX as u64).is_err());
        assert!(from_row_id(0).is_err());
        assert!(from_row_id(i64::MIN).is_err());
    }

    #[tokio::test]
    async fn load_past_key_range_skips_the_database() {
        // Lazy pool: nothing listens here, so any query would fail.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy_with(PgConnectOptions::new().host("127.0.0.1").port(1));
        let storage = PostgresStorage::new(pool);

        assert_eq!(storage.load(i64::MAX as u64).await.unwrap(), None);
        assert_eq!(storage.load(u64::MAX).await.unwrap(), None);
    }

    #[test]
    fn pool_errors_map_to_storage_errors() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolTimedOut),
            StorageError::Timeout(_)
        ));
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolClosed),
            StorageError::Unavailable(_)
        ));
        assert!(matches!(
            map_sqlx_error(sqlx::Error::RowNotFound),
            StorageError::InvalidData(_)
        ));
        assert!(matches!(
            map_insert_error(sqlx::Error::PoolClosed, "a.com"),
            StorageError::Unavailable(_)
        ));
    }

    #[test]
    fn ddl_creates_urls_table() {
        assert!(URLS_DDL.contains("CREATE TABLE IF NOT EXISTS urls"));
        assert!(URLS_DDL.contains("original TEXT NOT NULL UNIQUE"));
    }
}
