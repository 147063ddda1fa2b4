//! rankbot configuration
//!
//! Built once at startup from command-line arguments and environment
//! variables (see `main.rs`). Missing credentials do not stop the process;
//! they are reported by [`BridgeConfig::missing_required`] and surface as
//! failed requests later.

use rankbot_common::tiers::DEFAULT_MAX_MANAGED_RANK;
use rankbot_common::Rank;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_GROUPS_BASE_URL: &str = "https://groups.roblox.com";
pub const DEFAULT_CLOUD_BASE_URL: &str = "https://apis.roblox.com/cloud";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Bridge configuration
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub port: u16,
    /// Group whose memberships are managed
    pub group_id: String,
    /// Open Cloud API key, sent as `x-api-key` on writes
    pub api_key: String,
    /// Secret inbound callers must present
    pub shared_secret: String,
    pub retry: RetryPolicy,
    pub max_managed_rank: Rank,
    /// Optional TOML replacement for the built-in tier table
    pub tiers_file: Option<PathBuf>,
    pub groups_base_url: String,
    pub cloud_base_url: String,
    pub request_timeout: Duration,
}

impl BridgeConfig {
    /// Names of required settings that are empty
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.group_id.is_empty() {
            missing.push("GROUP_ID");
        }
        if self.api_key.is_empty() {
            missing.push("ROBLOX_API_KEY");
        }
        if self.shared_secret.is_empty() {
            missing.push("SHARED_SECRET");
        }
        missing
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            group_id: String::new(),
            api_key: String::new(),
            shared_secret: String::new(),
            retry: RetryPolicy::default(),
            max_managed_rank: DEFAULT_MAX_MANAGED_RANK,
            tiers_file: None,
            groups_base_url: DEFAULT_GROUPS_BASE_URL.to_string(),
            cloud_base_url: DEFAULT_CLOUD_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Trim whitespace and any trailing slash from a base URL
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
