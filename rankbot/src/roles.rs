//! Role directory cache
//!
//! Maps group rank numbers to role ids. Keys are the numeric `rank` field of
//! the group's role listing; role names are never used for matching.
//!
//! The map is rebuilt from a full listing and swapped in whole, so a reader
//! sees either the old map or the new one. A failed fetch leaves the current
//! map (possibly empty) untouched.

use rankbot_common::Rank;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::remote::{GroupApi, RemoteError, RoleId};

type RoleMap = HashMap<Rank, RoleId>;

/// Process-scoped rank → role id cache
pub struct RoleDirectory {
    api: Arc<dyn GroupApi>,
    roles: RwLock<Arc<RoleMap>>,
    /// Serializes fetches so concurrent first requests trigger one listing call
    load_lock: Mutex<()>,
}

impl RoleDirectory {
    pub fn new(api: Arc<dyn GroupApi>) -> Self {
        Self {
            api,
            roles: RwLock::new(Arc::new(HashMap::new())),
            load_lock: Mutex::new(()),
        }
    }

    /// Populate from the role listing if the cache is empty
    pub async fn ensure_loaded(&self) -> Result<(), RemoteError> {
        if !self.is_empty().await {
            return Ok(());
        }

        let _guard = self.load_lock.lock().await;
        // Another request may have loaded while we waited
        if !self.is_empty().await {
            return Ok(());
        }

        self.fetch_and_swap().await.map(|_| ())
    }

    /// Fetch the listing and replace the cache unconditionally
    ///
    /// Returns the number of cached roles.
    pub async fn refresh(&self) -> Result<usize, RemoteError> {
        let _guard = self.load_lock.lock().await;
        self.fetch_and_swap().await
    }

    async fn fetch_and_swap(&self) -> Result<usize, RemoteError> {
        let listing = self.api.fetch_roles().await?;

        let mut map = RoleMap::with_capacity(listing.len());
        for role in listing {
            // Later entries win if the listing repeats a rank
            map.insert(role.rank, role.id);
        }
        let count = map.len();

        *self.roles.write().await = Arc::new(map);
        tracing::info!(roles = count, "Loaded group roles");
        Ok(count)
    }

    /// Role id for a rank, if the group defines one
    pub async fn lookup(&self, rank: Rank) -> Option<RoleId> {
        self.snapshot().await.get(&rank).cloned()
    }

    /// Current map; unaffected by later refreshes
    pub async fn snapshot(&self) -> Arc<RoleMap> {
        Arc::clone(&*self.roles.read().await)
    }

    /// Drop all cached roles; the next request reloads
    pub async fn invalidate(&self) {
        *self.roles.write().await = Arc::new(HashMap::new());
        tracing::info!("Role directory invalidated");
    }

    pub async fn len(&self) -> usize {
        self.roles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.roles.read().await.is_empty()
    }
}
