//! JSON document store on SQLite.
//!
//! Every document lives in the `documents` table keyed by `(collection, id)`
//! with its body stored as JSON text. Writes go through the single-connection
//! writer pool; [`DocumentStore::update`] runs its read-modify-write inside
//! one transaction so a document is never observed half-updated.

use birdie_types::error::RepositoryError;
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::pool::DatabasePool;

pub const USERS: &str = "users";
pub const SESSIONS: &str = "sessions";

#[derive(Clone)]
pub struct DocumentStore {
    pool: DatabasePool,
}

fn query_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

fn decode<T: DeserializeOwned>(collection: &str, id: &str, body: &str) -> Result<T, RepositoryError> {
    serde_json::from_str(body)
        .map_err(|e| RepositoryError::Query(format!("invalid {collection} document '{id}': {e}")))
}

fn encode<T: Serialize>(doc: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(doc)
        .map_err(|e| RepositoryError::Query(format!("failed to serialize document: {e}")))
}

impl DocumentStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Fetch and decode a document. `Ok(None)` when absent.
    pub async fn get<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>, RepositoryError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT body FROM documents WHERE collection = ? AND id = ?")
                .bind(collection)
                .bind(id)
                .fetch_optional(&self.pool.reader)
                .await
                .map_err(query_err)?;

        row.map(|(body,)| decode(collection, id, &body)).transpose()
    }

    /// Create or fully replace a document.
    pub async fn put<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        doc: &T,
    ) -> Result<(), RepositoryError> {
        let body = encode(doc)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"INSERT INTO documents (collection, id, body, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT (collection, id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at"#,
        )
        .bind(collection)
        .bind(id)
        .bind(&body)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok(())
    }

    /// Apply `f` to a stored document and write it back atomically.
    ///
    /// Returns `RepositoryError::NotFound` if the document does not exist.
    /// If `f` fails, nothing is written.
    pub async fn update<T, R, F>(&self, collection: &str, id: &str, f: F) -> Result<R, RepositoryError>
    where
        T: Serialize + DeserializeOwned + Send,
        R: Send,
        F: FnOnce(&mut T) -> Result<R, RepositoryError> + Send,
    {
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        let row: Option<(String,)> =
            sqlx::query_as("SELECT body FROM documents WHERE collection = ? AND id = ?")
                .bind(collection)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(query_err)?;
        let Some((body,)) = row else {
            return Err(RepositoryError::NotFound);
        };

        let mut doc: T = decode(collection, id, &body)?;
        let out = f(&mut doc)?;
        let body = encode(&doc)?;

        sqlx::query("UPDATE documents SET body = ?, updated_at = ? WHERE collection = ? AND id = ?")
            .bind(&body)
            .bind(Utc::now().to_rfc3339())
            .bind(collection)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;

        tx.commit().await.map_err(query_err)?;
        Ok(out)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde::Deserialize;

    pub(crate) async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Counter {
        n: u32,
    }

    #[tokio::test]
    async fn test_put_get_and_upsert() {
        let store = DocumentStore::new(test_pool().await);
        assert_eq!(store.get::<Counter>("c", "a").await.unwrap(), None);

        store.put("c", "a", &Counter { n: 1 }).await.unwrap();
        store.put("c", "a", &Counter { n: 2 }).await.unwrap();
        assert_eq!(store.get::<Counter>("c", "a").await.unwrap(), Some(Counter { n: 2 }));

        // Same id in another collection is a different document.
        assert_eq!(store.get::<Counter>("other", "a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = DocumentStore::new(test_pool().await);
        let err = store
            .update("c", "missing", |c: &mut Counter| {
                c.n += 1;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_failed_update_writes_nothing() {
        let store = DocumentStore::new(test_pool().await);
        store.put("c", "a", &Counter { n: 1 }).await.unwrap();

        let result = store
            .update("c", "a", |c: &mut Counter| {
                c.n = 99;
                Err::<(), _>(RepositoryError::Conflict("nope".into()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(store.get::<Counter>("c", "a").await.unwrap(), Some(Counter { n: 1 }));
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_serialized() {
        let store = DocumentStore::new(test_pool().await);
        store.put("c", "a", &Counter { n: 0 }).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update("c", "a", |c: &mut Counter| {
                        c.n += 1;
                        Ok(())
                    })
                    .await
                    .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(store.get::<Counter>("c", "a").await.unwrap(), Some(Counter { n: 10 }));
    }

    #[tokio::test]
    async fn test_corrupt_body_is_query_error() {
        let store = DocumentStore::new(test_pool().await);
        sqlx::query(
            "INSERT INTO documents (collection, id, body, created_at, updated_at) VALUES ('c', 'a', '{\"x\":1}', '', '')",
        )
        .execute(&store.pool().writer)
        .await
        .unwrap();

        let err = store.get::<Counter>("c", "a").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Query(_)));
    }
}
