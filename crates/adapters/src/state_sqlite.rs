//! SQLite cursor store implementation

use async_trait::async_trait;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;
use time::OffsetDateTime;
use vk_wall_watch_domain::{CursorError, CursorStore, SourceCursor};

/// SQLite-backed cursor store
pub struct SqliteCursorStore {
    pool: SqlitePool,
}

impl SqliteCursorStore {
    /// Create a new SQLite cursor store, initializing the database if needed
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, CursorError> {
        let db_path = db_path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CursorError::Database(format!("Failed to create directory: {}", e)))?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(|e| CursorError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub async fn in_memory() -> Result<Self, CursorError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| CursorError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), CursorError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS wall_cursor (
                source TEXT PRIMARY KEY,
                last_post_id INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| CursorError::Database(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl CursorStore for SqliteCursorStore {
    async fn get_cursor(&self, source: &str) -> Result<Option<SourceCursor>, CursorError> {
        let row: Option<(String, i64, String)> = sqlx::query_as(
            "SELECT source, last_post_id, updated_at FROM wall_cursor WHERE source = ?",
        )
        .bind(source)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CursorError::Database(e.to_string()))?;

        match row {
            Some((source, last_post_id, updated_at_str)) => {
                let updated_at = OffsetDateTime::parse(
                    &updated_at_str,
                    &time::format_description::well_known::Rfc3339,
                )
                .map_err(|e| CursorError::Serialization(e.to_string()))?;

                Ok(Some(SourceCursor {
                    source,
                    last_post_id,
                    updated_at,
                }))
            }
            None => Ok(None),
        }
    }

    async fn set_cursor(&self, cursor: &SourceCursor) -> Result<(), CursorError> {
        let updated_at = cursor
            .updated_at
            .format(&time::format_description::well_known::Rfc3339)
            .map_err(|e| CursorError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO wall_cursor (source, last_post_id, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(source) DO UPDATE SET
                last_post_id = excluded.last_post_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&cursor.source)
        .bind(cursor.last_post_id)
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| CursorError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cursor_roundtrip() {
        let store = SqliteCursorStore::in_memory().await.unwrap();

        let cursor = SourceCursor {
            source: "-123".to_string(),
            last_post_id: 9,
            updated_at: OffsetDateTime::now_utc(),
        };

        store.set_cursor(&cursor).await.unwrap();
        let retrieved = store.get_cursor("-123").await.unwrap().unwrap();

        assert_eq!(retrieved.source, "-123");
        assert_eq!(retrieved.last_post_id, 9);
    }

    #[tokio::test]
    async fn unknown_source_has_no_cursor() {
        let store = SqliteCursorStore::in_memory().await.unwrap();
        let result = store.get_cursor("-999").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn set_cursor_upserts() {
        let store = SqliteCursorStore::in_memory().await.unwrap();

        let mut cursor = SourceCursor {
            source: "-123".to_string(),
            last_post_id: 9,
            updated_at: OffsetDateTime::now_utc(),
        };
        store.set_cursor(&cursor).await.unwrap();

        cursor.last_post_id = 11;
        store.set_cursor(&cursor).await.unwrap();

        let retrieved = store.get_cursor("-123").await.unwrap().unwrap();
        assert_eq!(retrieved.last_post_id, 11);
    }

    #[tokio::test]
    async fn sources_are_independent() {
        let store = SqliteCursorStore::in_memory().await.unwrap();

        for (source, id) in [("-1", 5), ("-2", 8)] {
            store
                .set_cursor(&SourceCursor {
                    source: source.to_string(),
                    last_post_id: id,
                    updated_at: OffsetDateTime::now_utc(),
                })
                .await
                .unwrap();
        }

        assert_eq!(store.get_cursor("-1").await.unwrap().unwrap().last_post_id, 5);
        assert_eq!(store.get_cursor("-2").await.unwrap().unwrap().last_post_id, 8);
    }

    #[tokio::test]
    async fn file_backed_store_persists_across_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let db_path = dir.path().join("state.sqlite");

        {
            let store = SqliteCursorStore::new(&db_path).await.unwrap();
            store
                .set_cursor(&SourceCursor {
                    source: "-123".to_string(),
                    last_post_id: 42,
                    updated_at: OffsetDateTime::now_utc(),
                })
                .await
                .unwrap();
        }

        let store = SqliteCursorStore::new(&db_path).await.unwrap();
        let retrieved = store.get_cursor("-123").await.unwrap().unwrap();
        assert_eq!(retrieved.last_post_id, 42);
    }
}
