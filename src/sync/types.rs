//! Sync data types
//!
//! Defines the wire types for the sync protocol:
//! - Per-user records holding the full item list
//! - Push / pull requests and responses
//! - Conflict resolution requests

use std::fmt;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier used when a client does not name a user
pub const DEFAULT_USER_ID: &str = "default";

/// Identifier of the user whose record is being synced
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build from an optional raw header value, falling back to the default
    /// user when the value is missing or empty
    pub fn from_header(value: Option<&str>) -> Self {
        match value {
            Some(id) if !id.is_empty() => Self::new(id),
            _ => Self::default(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self(DEFAULT_USER_ID.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The persisted state for one user
///
/// A push replaces the whole record; there is no per-item versioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord<T = Value> {
    /// Items exactly as the client sent them
    pub items: Vec<T>,
    /// Time of the most recent push
    #[serde(with = "iso_millis")]
    pub last_sync: DateTime<Utc>,
    /// Epoch milliseconds of the most recent push
    pub server_timestamp: i64,
}

impl<T> UserRecord<T> {
    /// Create a record stamped at `at`, truncated to milliseconds
    pub fn new(items: Vec<T>, at: DateTime<Utc>) -> Self {
        let at = at.trunc_subsecs(3);
        Self {
            items,
            last_sync: at,
            server_timestamp: at.timestamp_millis(),
        }
    }
}

/// Serde adapter writing timestamps as `2024-05-01T12:00:00.000Z`
pub mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::iso_timestamp(*at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Request to push the full local item list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRequest {
    /// Items to store
    pub items: Vec<Value>,
    /// Client's last sync marker; accepted but not stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<Value>,
}

/// Response from push operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushResponse {
    pub success: bool,
    /// Number of items stored
    pub synced: usize,
    pub server_timestamp: i64,
}

/// Response from pull operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullResponse {
    pub items: Vec<Value>,
    pub server_timestamp: i64,
}

/// Which side the caller picked
///
/// Only the literal string `"local"` selects the local version. Every other
/// value, including a missing one, selects the server version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "Value")]
pub enum Resolution {
    Local,
    #[default]
    Server,
}

impl From<Value> for Resolution {
    fn from(value: Value) -> Self {
        match value.as_str() {
            Some("local") => Resolution::Local,
            _ => Resolution::Server,
        }
    }
}

/// Request to pick one of two competing versions
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    #[serde(default)]
    pub local_version: Value,
    #[serde(default)]
    pub server_version: Value,
    #[serde(default)]
    pub resolution: Resolution,
}

/// Response from resolve operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub resolved: bool,
    pub winner: Value,
    pub timestamp: String,
}

/// Format a timestamp the way browsers do (`2024-05-01T12:00:00.000Z`)
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
