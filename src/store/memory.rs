//! In-memory record store

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{RecordStore, StoreError};
use crate::sync::{UserId, UserRecord};

/// Process-local store; contents are lost on restart
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<UserId, UserRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, user_id: &UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.records.read().get(user_id).cloned())
    }

    async fn put(&self, user_id: &UserId, record: &UserRecord) -> Result<(), StoreError> {
        self.records.write().insert(user_id.clone(), record.clone());
        Ok(())
    }
}
