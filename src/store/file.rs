//! File-backed record store
//!
//! Layout: `<data_dir>/<percent-encoded user id>.json`. Writes go to a temp
//! file in the same directory which is fsynced and renamed over the record.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::{RecordStore, StoreError};
use crate::sync::{UserId, UserRecord};

/// One JSON file per user
pub struct FileRecordStore {
    base_path: PathBuf,
    /// Per-user write locks, present only while a put is in flight
    write_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl FileRecordStore {
    /// Open a store rooted at `base_path`, creating the directory if needed
    pub async fn open(base_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base_path = base_path.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&base_path).await?;

        tracing::info!(path = %base_path.display(), "File record store ready");

        Ok(Self {
            base_path,
            write_locks: Mutex::new(HashMap::new()),
        })
    }

    fn file_stem(user_id: &UserId) -> String {
        urlencoding::encode(user_id.as_str()).into_owned()
    }

    fn record_path(&self, user_id: &UserId) -> PathBuf {
        self.base_path
            .join(format!("{}.json", Self::file_stem(user_id)))
    }

    fn temp_path(&self, user_id: &UserId) -> PathBuf {
        self.base_path
            .join(format!(".{}.{}.tmp", Self::file_stem(user_id), Uuid::new_v4()))
    }

    fn write_lock(&self, user_id: &UserId) -> Arc<tokio::sync::Mutex<()>> {
        self.write_locks
            .lock()
            .entry(user_id.as_str().to_string())
            .or_default()
            .clone()
    }

    /// Drop the user's lock entry once no other put holds it
    fn release_lock(&self, user_id: &UserId, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.write_locks.lock();
        // One reference in the map plus ours means nobody else is waiting
        if Arc::strong_count(&lock) == 2 {
            locks.remove(user_id.as_str());
        }
    }
}

#[async_trait::async_trait]
impl RecordStore for FileRecordStore {
    async fn get(&self, user_id: &UserId) -> Result<Option<UserRecord>, StoreError> {
        let path = self.record_path(user_id);

        let contents = match tokio::fs::read(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(serde_json::from_slice(&contents)?))
    }

    async fn put(&self, user_id: &UserId, record: &UserRecord) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(record)?;

        let lock = self.write_lock(user_id);
        let guard = lock.lock().await;

        let temp = self.temp_path(user_id);
        let target = self.record_path(user_id);

        let result = write_atomically(&temp, &target, &bytes).await;
        if result.is_err() {
            if let Err(cleanup) = tokio::fs::remove_file(&temp).await {
                tracing::debug!(path = %temp.display(), "Temp file not removed: {}", cleanup);
            }
        }

        drop(guard);
        self.release_lock(user_id, lock);

        result
    }
}

async fn write_atomically(temp: &Path, target: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut file = tokio::fs::File::create(temp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(temp, target).await?;
    Ok(())
}
