//! Sync module for offline-first clients
//!
//! Provides:
//! - Full-state push and pull of a per-user item list
//! - Caller-directed conflict resolution
//!
//! # Sync Protocol
//!
//! 1. Client sends `PushRequest` with its whole item list
//! 2. Server replaces the user's record and stamps `serverTimestamp`
//! 3. Client pulls to get the stored list back on another device
//! 4. On conflict, client sends both versions plus `"local"` or `"server"`
//!    to `/resolve` and stores the returned winner
//!
//! The last push wins; nothing is merged on the server.

mod conflict;
mod service;
mod types;

pub use conflict::{ConflictResolver, ConflictWinner, ResolvedConflict};
pub use service::{SyncClock, SyncService};
pub use types::{
    iso_timestamp, PullResponse, PushRequest, PushResponse, Resolution, ResolveRequest,
    ResolveResponse, UserId, UserRecord, DEFAULT_USER_ID,
};
