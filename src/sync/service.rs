//! Push / pull / resolve over a record store

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use super::conflict::ConflictResolver;
use super::types::{
    iso_timestamp, PullResponse, PushRequest, PushResponse, ResolveRequest, ResolveResponse,
    UserId, UserRecord,
};
use crate::store::{RecordStore, StoreError};

/// Wall clock that never hands out an earlier millisecond than before
#[derive(Debug, Default)]
pub struct SyncClock {
    last_millis: AtomicI64,
}

impl SyncClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now();
        let millis = wall.timestamp_millis();
        let previous = self.last_millis.fetch_max(millis, Ordering::SeqCst);

        if previous > millis {
            Utc.timestamp_millis_opt(previous).single().unwrap_or(wall)
        } else {
            wall
        }
    }
}

/// Sync operations shared by all request handlers
pub struct SyncService {
    store: Arc<dyn RecordStore>,
    resolver: ConflictResolver,
    clock: SyncClock,
}

impl SyncService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            resolver: ConflictResolver::new(),
            clock: SyncClock::new(),
        }
    }

    /// Replace the user's record with the pushed items
    pub async fn push(&self, user_id: &UserId, req: PushRequest) -> Result<PushResponse, StoreError> {
        if let Some(client_last_sync) = &req.last_sync {
            tracing::debug!(user = %user_id, last_sync = %client_last_sync, "Client sync marker");
        }

        let synced = req.items.len();
        let record = UserRecord::new(req.items, self.clock.now());
        self.store.put(user_id, &record).await?;

        tracing::info!(user = %user_id, synced, server_timestamp = record.server_timestamp, "Push stored");

        Ok(PushResponse {
            success: true,
            synced,
            server_timestamp: record.server_timestamp,
        })
    }

    /// Read the user's record; a missing record reads as empty
    pub async fn pull(&self, user_id: &UserId) -> Result<PullResponse, StoreError> {
        let response = match self.store.get(user_id).await? {
            Some(record) => PullResponse {
                items: record.items,
                server_timestamp: record.server_timestamp,
            },
            None => PullResponse {
                items: Vec::new(),
                server_timestamp: self.clock.now().timestamp_millis(),
            },
        };

        tracing::debug!(user = %user_id, items = response.items.len(), "Pull served");

        Ok(response)
    }

    /// Echo back the version the caller picked
    pub fn resolve(&self, req: ResolveRequest) -> ResolveResponse {
        let resolved = self
            .resolver
            .resolve(req.local_version, req.server_version, req.resolution);

        tracing::debug!(winner = ?resolved.winner, "Conflict resolved");

        ResolveResponse {
            resolved: true,
            winner: resolved.data,
            timestamp: iso_timestamp(Utc::now()),
        }
    }
}
