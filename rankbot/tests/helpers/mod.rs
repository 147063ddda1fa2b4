//! Test Helper Utilities
//!
//! Scripted in-memory group API and a sleeper that records backoff delays
//! instead of waiting.

#![allow(dead_code)]

use async_trait::async_trait;
use rankbot::remote::{GroupApi, GroupRole, RemoteError, RoleId};
use rankbot::retry::{RetryPolicy, Sleeper};
use rankbot::PromotionPipeline;
use rankbot_common::api::PromotionRequest;
use rankbot_common::{Rank, TierTable};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SECRET: &str = "test-secret";
pub const OWNER_ID: u64 = 1;

/// Role id the standard listing assigns to a rank
pub fn role_for(rank: Rank) -> RoleId {
    RoleId::from(30_000_000 + rank as u64)
}

/// Ranks present in the standard listing: guest, the managed tiers and the
/// owner role. Rank 6 is deliberately absent.
pub fn standard_roles() -> Vec<GroupRole> {
    [0u8, 1, 2, 3, 4, 5, 7, 8, 9, 10, 255]
        .into_iter()
        .map(|rank| GroupRole {
            id: role_for(rank),
            name: format!("Rank {}", rank),
            rank,
        })
        .collect()
}

pub fn status_error(status: u16, body: &str) -> RemoteError {
    RemoteError::Status {
        status,
        body: body.to_string(),
    }
}

/// In-memory group service
///
/// Successful writes update the stored current role so later reads see them.
pub struct FakeGroupApi {
    owner: Mutex<Result<Option<u64>, RemoteError>>,
    roles: Mutex<Result<Vec<GroupRole>, RemoteError>>,
    current_roles: Mutex<HashMap<u64, RoleId>>,
    current_role_error: Mutex<Option<RemoteError>>,
    write_script: Mutex<VecDeque<Result<(), RemoteError>>>,
    write_delay: Mutex<Option<Duration>>,
    writes: Mutex<Vec<(u64, RoleId)>>,
    pub owner_calls: AtomicUsize,
    pub roles_calls: AtomicUsize,
    pub current_role_calls: AtomicUsize,
    pub write_calls: AtomicUsize,
}

impl FakeGroupApi {
    pub fn new() -> Self {
        Self {
            owner: Mutex::new(Ok(Some(OWNER_ID))),
            roles: Mutex::new(Ok(standard_roles())),
            current_roles: Mutex::new(HashMap::new()),
            current_role_error: Mutex::new(None),
            write_script: Mutex::new(VecDeque::new()),
            write_delay: Mutex::new(None),
            writes: Mutex::new(Vec::new()),
            owner_calls: AtomicUsize::new(0),
            roles_calls: AtomicUsize::new(0),
            current_role_calls: AtomicUsize::new(0),
            write_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_owner(&self, owner: Result<Option<u64>, RemoteError>) {
        *self.owner.lock().unwrap() = owner;
    }

    pub fn set_roles(&self, roles: Result<Vec<GroupRole>, RemoteError>) {
        *self.roles.lock().unwrap() = roles;
    }

    pub fn set_current_role(&self, user_id: u64, role_id: RoleId) {
        self.current_roles.lock().unwrap().insert(user_id, role_id);
    }

    pub fn current_role_of(&self, user_id: u64) -> Option<RoleId> {
        self.current_roles.lock().unwrap().get(&user_id).cloned()
    }

    pub fn fail_current_role(&self, error: RemoteError) {
        *self.current_role_error.lock().unwrap() = Some(error);
    }

    /// Queue results for upcoming writes; once drained, writes succeed
    pub fn script_writes(&self, results: Vec<Result<(), RemoteError>>) {
        self.write_script.lock().unwrap().extend(results);
    }

    pub fn set_write_delay(&self, delay: Duration) {
        *self.write_delay.lock().unwrap() = Some(delay);
    }

    pub fn writes(&self) -> Vec<(u64, RoleId)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.owner_calls.load(Ordering::SeqCst)
            + self.roles_calls.load(Ordering::SeqCst)
            + self.current_role_calls.load(Ordering::SeqCst)
            + self.write_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GroupApi for FakeGroupApi {
    async fn fetch_owner(&self) -> Result<Option<u64>, RemoteError> {
        self.owner_calls.fetch_add(1, Ordering::SeqCst);
        self.owner.lock().unwrap().clone()
    }

    async fn fetch_roles(&self) -> Result<Vec<GroupRole>, RemoteError> {
        self.roles_calls.fetch_add(1, Ordering::SeqCst);
        self.roles.lock().unwrap().clone()
    }

    async fn fetch_current_role(&self, user_id: u64) -> Result<Option<RoleId>, RemoteError> {
        self.current_role_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.current_role_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(self.current_role_of(user_id))
    }

    async fn set_member_role(&self, user_id: u64, role_id: &RoleId) -> Result<(), RemoteError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.write_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let result = self.write_script.lock().unwrap().pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            self.writes.lock().unwrap().push((user_id, role_id.clone()));
            self.set_current_role(user_id, role_id.clone());
        }
        result
    }
}

/// Records requested backoff delays without waiting
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

/// Pipeline over a fake API with the default tiers and 4 x 250ms retry
pub fn test_pipeline(api: Arc<FakeGroupApi>, sleeper: Arc<RecordingSleeper>) -> PromotionPipeline {
    PromotionPipeline::new(
        api,
        TierTable::default(),
        RetryPolicy::new(4, Duration::from_millis(250)),
        SECRET,
    )
    .with_sleeper(sleeper)
}

/// Authenticated, loaded request
pub fn request(user_id: u64, xp: f64) -> PromotionRequest {
    serde_json::from_value(json!({
        "userId": user_id,
        "xp": xp,
        "loaded": true,
        "secret": SECRET,
    }))
    .unwrap()
}
