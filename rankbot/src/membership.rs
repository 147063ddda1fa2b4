//! Membership synchronizer
//!
//! Compares a user's current role with the target and writes only when they
//! differ. The write goes through the retry policy.

use std::sync::Arc;
use thiserror::Error;

use crate::remote::{GroupApi, RemoteError, RoleId};
use crate::retry::{RetryPolicy, Sleeper, TokioSleeper};

/// Result of a successful sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Role was written
    Applied,
    /// User already held the target role; nothing was written
    AlreadyCorrect,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Current role could not be read
    #[error("Failed to read current role: {0}")]
    CurrentRole(RemoteError),

    /// Write failed fatally or exhausted its retries
    #[error("Failed to update membership: {0}")]
    Write(RemoteError),
}

pub struct MembershipSynchronizer {
    api: Arc<dyn GroupApi>,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl MembershipSynchronizer {
    pub fn new(api: Arc<dyn GroupApi>, retry: RetryPolicy) -> Self {
        Self {
            api,
            retry,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the backoff sleeper (tests record delays instead of waiting)
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub async fn current_role(&self, user_id: u64) -> Result<Option<RoleId>, SyncError> {
        self.api
            .fetch_current_role(user_id)
            .await
            .map_err(SyncError::CurrentRole)
    }

    /// Bring the user's role to `target`
    pub async fn sync(&self, user_id: u64, target: &RoleId) -> Result<SyncStatus, SyncError> {
        let current = self.current_role(user_id).await?;

        if current.as_ref() == Some(target) {
            tracing::debug!(user_id, role_id = %target, "Role already correct");
            return Ok(SyncStatus::AlreadyCorrect);
        }

        let from = current.as_ref().map(RoleId::as_str).unwrap_or("none");
        tracing::info!(
            user_id,
            from,
            to = %target,
            "Updating member role"
        );

        self.retry
            .execute(self.sleeper.as_ref(), "set_member_role", || {
                self.api.set_member_role(user_id, target)
            })
            .await
            .map_err(SyncError::Write)?;

        Ok(SyncStatus::Applied)
    }
}
