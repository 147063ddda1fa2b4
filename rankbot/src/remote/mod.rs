//! Remote group-membership API
//!
//! Everything the bridge needs from the group service goes through
//! [`GroupApi`]: three reads (owner, role listing, a user's current role) and
//! one write (set a member's role). Production uses [`RobloxClient`]; tests
//! inject fakes.

use async_trait::async_trait;
use rankbot_common::Rank;
use serde::{Deserialize, Deserializer};
use std::fmt;
use thiserror::Error;

pub mod roblox;

pub use roblox::RobloxClient;

/// Group API errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Request never produced an HTTP response
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status, with the response body
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),
}

impl RemoteError {
    /// Response body when there is one, otherwise a description
    pub fn detail(&self) -> String {
        match self {
            RemoteError::Status { status, body } if body.trim().is_empty() => {
                format!("HTTP {}", status)
            }
            RemoteError::Status { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}

/// Opaque role identifier assigned by the group service
///
/// The service sends numeric ids; they are kept as text and only ever
/// compared for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoleId(String);

impl RoleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for RoleId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numeric or string id as it appears in API responses
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawId {
    Number(u64),
    Text(String),
}

impl RawId {
    pub(crate) fn into_string(self) -> String {
        match self {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

impl<'de> Deserialize<'de> for RoleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawId::deserialize(deserializer).map(|raw| RoleId(raw.into_string()))
    }
}

/// One entry of the group's role listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroupRole {
    pub id: RoleId,
    #[serde(default)]
    pub name: String,
    /// Rank number (0-255); the role directory is keyed on this
    pub rank: Rank,
}

/// Operations the bridge performs against the group service
#[async_trait]
pub trait GroupApi: Send + Sync {
    /// User id of the group owner, `None` for an ownerless group
    async fn fetch_owner(&self) -> Result<Option<u64>, RemoteError>;

    /// Full role listing for the group
    async fn fetch_roles(&self) -> Result<Vec<GroupRole>, RemoteError>;

    /// The user's current role in the group, `None` if not a member
    async fn fetch_current_role(&self, user_id: u64) -> Result<Option<RoleId>, RemoteError>;

    /// Set the user's role. The only state-changing call.
    async fn set_member_role(&self, user_id: u64, role_id: &RoleId) -> Result<(), RemoteError>;
}
