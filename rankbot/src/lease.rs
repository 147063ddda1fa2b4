//! Per-user leases
//!
//! Serializes the resolve-and-sync step for one user so duplicate updates
//! arriving together cannot both read the same stale role and both write.
//! Different users never contend.
//!
//! A lease is released when dropped, on every exit path. Registry entries are
//! removed once no request holds or waits on them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, OwnedMutexGuard};

type Registry = HashMap<u64, Arc<Mutex<()>>>;

/// Registry of per-user async locks
#[derive(Default)]
pub struct UserLeases {
    entries: Arc<StdMutex<Registry>>,
}

/// Exclusive hold on one user; released on drop
pub struct UserLease {
    user_id: u64,
    guard: Option<OwnedMutexGuard<()>>,
    lock: Arc<Mutex<()>>,
    entries: Arc<StdMutex<Registry>>,
}

impl UserLeases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and take the lease for `user_id`
    pub async fn acquire(&self, user_id: u64) -> UserLease {
        let lock = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(entries.entry(user_id).or_default())
        };

        let guard = Arc::clone(&lock).lock_owned().await;

        UserLease {
            user_id,
            guard: Some(guard),
            lock,
            entries: Arc::clone(&self.entries),
        }
    }

    /// Number of users with a held or awaited lease
    pub fn active(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl UserLease {
    pub fn user_id(&self) -> u64 {
        self.user_id
    }
}

impl Drop for UserLease {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = entries.get(&self.user_id) {
            // Registry + this lease are the only holders: nobody is waiting
            if Arc::ptr_eq(entry, &self.lock) && Arc::strong_count(&self.lock) == 2 {
                entries.remove(&self.user_id);
            }
        }
    }
}
