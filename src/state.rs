//! Application state management

use std::sync::Arc;

use crate::store::RecordStore;
use crate::sync::SyncService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    sync: SyncService,
}

impl AppState {
    /// Create a new application state over a record store
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                sync: SyncService::new(store),
            }),
        }
    }

    /// Get the sync service
    pub fn sync(&self) -> &SyncService {
        &self.inner.sync
    }
}
