//! Conflict resolution
//!
//! The caller decides which side wins; the resolver only hands the chosen
//! payload back. There is no merge and no timestamp comparison.

use serde_json::Value;

use super::types::Resolution;

/// Picks between a local and a server version of the same data
#[derive(Debug, Default, Clone, Copy)]
pub struct ConflictResolver;

impl ConflictResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a conflict and return the winning data
    pub fn resolve(
        &self,
        local_version: Value,
        server_version: Value,
        resolution: Resolution,
    ) -> ResolvedConflict {
        match resolution {
            Resolution::Local => ResolvedConflict {
                winner: ConflictWinner::Local,
                data: local_version,
            },
            Resolution::Server => ResolvedConflict {
                winner: ConflictWinner::Server,
                data: server_version,
            },
        }
    }
}

/// Result of conflict resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConflict {
    pub winner: ConflictWinner,
    pub data: Value,
}

/// Which side won the conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictWinner {
    Local,
    Server,
}
