//! Group owner guard
//!
//! The group owner is never modified by the bridge. Loading the owner is
//! best-effort: a failed lookup is logged and the guard simply stays
//! unarmed until a later request loads it.

use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::remote::GroupApi;

/// Process-scoped cache of the group owner's user id
pub struct OwnerGuard {
    api: Arc<dyn GroupApi>,
    owner: RwLock<Option<u64>>,
    load_lock: Mutex<()>,
}

impl OwnerGuard {
    pub fn new(api: Arc<dyn GroupApi>) -> Self {
        Self {
            api,
            owner: RwLock::new(None),
            load_lock: Mutex::new(()),
        }
    }

    /// Load the owner if not yet known. Never fails.
    pub async fn ensure_loaded(&self) {
        if self.owner().await.is_some() {
            return;
        }

        let _guard = self.load_lock.lock().await;
        if self.owner().await.is_some() {
            return;
        }

        match self.api.fetch_owner().await {
            Ok(Some(user_id)) => {
                *self.owner.write().await = Some(user_id);
                tracing::info!(owner_id = user_id, "Loaded group owner");
            }
            Ok(None) => {
                tracing::warn!("Group has no owner; owner guard inactive");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load group owner; will retry on next request");
            }
        }
    }

    pub async fn is_protected(&self, user_id: u64) -> bool {
        self.owner().await == Some(user_id)
    }

    pub async fn owner(&self) -> Option<u64> {
        *self.owner.read().await
    }

    pub async fn invalidate(&self) {
        *self.owner.write().await = None;
    }
}
