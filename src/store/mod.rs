//! User record persistence
//!
//! The sync service only sees the [`RecordStore`] trait. Three backings are
//! provided:
//! - `file`: one pretty-printed JSON file per user (the default)
//! - `sqlite`: a single `user_records` table
//! - `memory`: a process-local map, for tests and throwaway runs
//!
//! Every backing must make `put` atomic per user: a concurrent `get` sees
//! either the old record or the new one, never a mix.

mod file;
mod memory;
mod sqlite;

pub use file::FileRecordStore;
pub use memory::MemoryRecordStore;
pub use sqlite::SqliteRecordStore;

use std::sync::Arc;

use thiserror::Error;

use crate::config::{StoreBackend, StoreConfig};
use crate::sync::{UserId, UserRecord};

/// Errors raised by a record store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Message of the underlying error, without the category label
    pub fn detail(&self) -> String {
        match self {
            StoreError::Io(e) => e.to_string(),
            StoreError::Serialization(e) => e.to_string(),
            StoreError::Database(e) => e.to_string(),
        }
    }
}

/// Key-value persistence for user records
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Get the current record, or `None` if the user never pushed
    async fn get(&self, user_id: &UserId) -> Result<Option<UserRecord>, StoreError>;

    /// Store or overwrite the record for a user
    async fn put(&self, user_id: &UserId, record: &UserRecord) -> Result<(), StoreError>;
}

/// Open the store selected by the configuration
pub async fn open(config: &StoreConfig) -> Result<Arc<dyn RecordStore>, StoreError> {
    let store: Arc<dyn RecordStore> = match config.backend {
        StoreBackend::File => Arc::new(FileRecordStore::open(&config.data_dir).await?),
        StoreBackend::Sqlite => Arc::new(SqliteRecordStore::connect(&config.database_url).await?),
        StoreBackend::Memory => Arc::new(MemoryRecordStore::new()),
    };

    Ok(store)
}
