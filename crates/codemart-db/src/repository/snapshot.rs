//! # Snapshot Repository
//!
//! Stores whole JSON values under a string key in `local_state`.
//!
//! ## Write Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  put("cart", lines)                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT INTO local_state (key, value, updated_at) VALUES (?, ?, ?)     │
//! │  ON CONFLICT(key) DO UPDATE SET value = excluded.value, ...            │
//! │                                                                         │
//! │  One statement per write: the stored value is either the previous      │
//! │  snapshot or the new one, never a mix.                                 │
//! │                                                                         │
//! │  delete("cart")  ──► row removed; get("cart") returns None             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Repository for keyed JSON snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotRepository {
    pool: SqlitePool,
}

impl SnapshotRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SnapshotRepository { pool }
    }

    /// Reads and decodes the snapshot stored under `key`.
    ///
    /// ## Returns
    /// - `Ok(None)` when no entry exists
    /// - `Err(CorruptSnapshot)` when the stored text doesn't decode as `T`
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        let Some(raw) = self.get_raw(key).await? else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| DbError::corrupt(key, e))
    }

    /// Reads the stored text without decoding it.
    pub async fn get_raw(&self, key: &str) -> DbResult<Option<String>> {
        let row = sqlx::query("SELECT value FROM local_state WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    /// Replaces the snapshot under `key` in one statement.
    pub async fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> DbResult<()> {
        let json = serde_json::to_string(value).map_err(|e| DbError::corrupt(key, e))?;
        self.put_raw(key, &json).await
    }

    /// Stores already-encoded text under `key`.
    pub async fn put_raw(&self, key: &str, value: &str) -> DbResult<()> {
        let now = Utc::now().to_rfc3339();

        debug!(key = %key, bytes = value.len(), "Writing snapshot");

        sqlx::query(
            r#"
            INSERT INTO local_state (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Removes the entry. Returns whether one existed.
    pub async fn delete(&self, key: &str) -> DbResult<bool> {
        debug!(key = %key, "Deleting snapshot");

        let result = sqlx::query("DELETE FROM local_state WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn exists(&self, key: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM local_state WHERE key = ?1")
            .bind(key)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Entry {
        name: String,
        qty: i64,
    }

    async fn repo() -> SnapshotRepository {
        Database::new(DbConfig::in_memory())
            .await
            .unwrap()
            .snapshots()
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let repo = repo().await;
        let value: Option<Vec<Entry>> = repo.get("cart").await.unwrap();
        assert!(value.is_none());
        assert!(!repo.exists("cart").await.unwrap());
    }

    #[tokio::test]
    async fn test_put_replaces_whole_value() {
        let repo = repo().await;

        let first = vec![Entry { name: "a".into(), qty: 1 }];
        repo.put("cart", &first).await.unwrap();

        let second = vec![
            Entry { name: "b".into(), qty: 2 },
            Entry { name: "c".into(), qty: 3 },
        ];
        repo.put("cart", &second).await.unwrap();

        let stored: Vec<Entry> = repo.get("cart").await.unwrap().unwrap();
        assert_eq!(stored, second);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let repo = repo().await;
        repo.put("cart", &vec![1, 2, 3]).await.unwrap();
        repo.put("session", &Entry { name: "ada".into(), qty: 0 })
            .await
            .unwrap();

        assert!(repo.delete("cart").await.unwrap());
        assert!(!repo.exists("cart").await.unwrap());
        assert!(repo.exists("session").await.unwrap());
        assert!(!repo.delete("cart").await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_value_is_reported() {
        let repo = repo().await;
        repo.put_raw("cart", "{not json").await.unwrap();

        let result: DbResult<Option<Vec<Entry>>> = repo.get("cart").await;
        assert!(matches!(result, Err(DbError::CorruptSnapshot { .. })));
        assert_eq!(repo.get_raw("cart").await.unwrap().as_deref(), Some("{not json"));
    }
}
