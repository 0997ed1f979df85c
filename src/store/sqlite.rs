//! SQLite record store
//!
//! One row per user; items are kept as a JSON text column.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};

use super::{RecordStore, StoreError};
use crate::sync::{iso_timestamp, UserId, UserRecord};

/// Store backed by a SQLite database
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Connect to `database_url`, creating the database and table if missing
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        tracing::info!("SQLite record store initialized at {}", database_url);

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    /// Initialize the records table
    async fn init(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_records (
                user_id TEXT PRIMARY KEY,
                items_json TEXT NOT NULL,
                last_sync TEXT NOT NULL,
                server_timestamp INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl RecordStore for SqliteRecordStore {
    async fn get(&self, user_id: &UserId) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, RecordRow>(
            r#"
            SELECT items_json, last_sync, server_timestamp
            FROM user_records
            WHERE user_id = ?
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(RecordRow::into_record).transpose()
    }

    async fn put(&self, user_id: &UserId, record: &UserRecord) -> Result<(), StoreError> {
        let items_json = serde_json::to_string(&record.items)?;

        sqlx::query(
            r#"
            INSERT INTO user_records (user_id, items_json, last_sync, server_timestamp)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                items_json = excluded.items_json,
                last_sync = excluded.last_sync,
                server_timestamp = excluded.server_timestamp
            "#,
        )
        .bind(user_id.as_str())
        .bind(&items_json)
        .bind(iso_timestamp(record.last_sync))
        .bind(record.server_timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    items_json: String,
    last_sync: String,
    server_timestamp: i64,
}

impl RecordRow {
    fn into_record(self) -> Result<UserRecord, StoreError> {
        let items = serde_json::from_str(&self.items_json)?;
        let last_sync = DateTime::parse_from_rfc3339(&self.last_sync)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
            .with_timezone(&Utc);

        Ok(UserRecord {
            items,
            last_sync,
            server_timestamp: self.server_timestamp,
        })
    }
}
