//! Roblox groups API client
//!
//! Reads go to the public groups API (no credentials). The membership write
//! goes to Open Cloud v2 and authenticates with the configured API key.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::{GroupApi, GroupRole, RawId, RemoteError, RoleId};
use crate::config::{normalize_base_url, BridgeConfig};

const USER_AGENT: &str = concat!("rankbot/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct GroupInfo {
    owner: Option<GroupOwner>,
}

#[derive(Debug, Deserialize)]
struct GroupOwner {
    #[serde(rename = "userId")]
    user_id: u64,
}

#[derive(Debug, Deserialize)]
struct RoleListing {
    #[serde(default)]
    roles: Vec<GroupRole>,
}

#[derive(Debug, Deserialize)]
struct UserGroupRoles {
    #[serde(default)]
    data: Vec<UserGroupRole>,
}

#[derive(Debug, Deserialize)]
struct UserGroupRole {
    group: GroupRef,
    role: RoleRef,
}

#[derive(Debug, Deserialize)]
struct GroupRef {
    id: RawId,
}

#[derive(Debug, Deserialize)]
struct RoleRef {
    id: RoleId,
}

/// Roblox API client
pub struct RobloxClient {
    http_client: reqwest::Client,
    group_id: String,
    api_key: String,
    groups_base_url: String,
    cloud_base_url: String,
}

impl RobloxClient {
    pub fn new(config: &BridgeConfig) -> Result<Self, RemoteError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            group_id: config.group_id.clone(),
            api_key: config.api_key.clone(),
            groups_base_url: normalize_base_url(&config.groups_base_url),
            cloud_base_url: normalize_base_url(&config.cloud_base_url),
        })
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Path Open Cloud expects in the membership `role` field
    pub fn role_path(&self, role_id: &RoleId) -> String {
        format!("groups/{}/roles/{}", self.group_id, role_id)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, RemoteError> {
        tracing::debug!(url = %url, "Querying groups API");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| RemoteError::Parse(e.to_string()))
    }
}

#[async_trait]
impl GroupApi for RobloxClient {
    async fn fetch_owner(&self) -> Result<Option<u64>, RemoteError> {
        let url = format!("{}/v1/groups/{}", self.groups_base_url, self.group_id);
        let info: GroupInfo = self.get_json(&url).await?;
        Ok(info.owner.map(|owner| owner.user_id))
    }

    async fn fetch_roles(&self) -> Result<Vec<GroupRole>, RemoteError> {
        let url = format!("{}/v1/groups/{}/roles", self.groups_base_url, self.group_id);
        let listing: RoleListing = self.get_json(&url).await?;
        Ok(listing.roles)
    }

    async fn fetch_current_role(&self, user_id: u64) -> Result<Option<RoleId>, RemoteError> {
        let url = format!("{}/v2/users/{}/groups/roles", self.groups_base_url, user_id);
        let memberships: UserGroupRoles = self.get_json(&url).await?;

        Ok(memberships
            .data
            .into_iter()
            .find(|entry| match &entry.group.id {
                RawId::Number(n) => n.to_string() == self.group_id,
                RawId::Text(s) => *s == self.group_id,
            })
            .map(|entry| entry.role.id))
    }

    async fn set_member_role(&self, user_id: u64, role_id: &RoleId) -> Result<(), RemoteError> {
        let url = format!(
            "{}/v2/groups/{}/memberships/{}",
            self.cloud_base_url, self.group_id, user_id
        );

        tracing::debug!(user_id, role_id = %role_id, "Updating group membership");

        let response = self
            .http_client
            .patch(&url)
            .header("x-api-key", &self.api_key)
            .json(&json!({ "role": self.role_path(role_id) }))
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        Err(RemoteError::Status {
            status: status.as_u16(),
            body,
        })
    }
}
