//! Component tests for the role directory, owner guard and membership
//! synchronizer against the in-memory group API

mod helpers;

use helpers::*;
use rankbot::membership::{MembershipSynchronizer, SyncError, SyncStatus};
use rankbot::owner::OwnerGuard;
use rankbot::remote::{GroupRole, RoleId};
use rankbot::retry::RetryPolicy;
use rankbot::roles::RoleDirectory;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

// =============================================================================
// Role Directory
// =============================================================================

#[tokio::test]
async fn test_directory_starts_empty_and_loads_once() {
    let api = Arc::new(FakeGroupApi::new());
    let directory = RoleDirectory::new(api.clone());

    assert!(directory.is_empty().await);
    assert_eq!(directory.lookup(5).await, None);

    directory.ensure_loaded().await.unwrap();
    directory.ensure_loaded().await.unwrap();

    assert_eq!(api.roles_calls.load(Ordering::SeqCst), 1);
    assert_eq!(directory.len().await, standard_roles().len());
    assert_eq!(directory.lookup(5).await, Some(role_for(5)));
    assert_eq!(directory.lookup(6).await, None);
}

#[tokio::test]
async fn test_directory_failure_leaves_map_untouched() {
    let api = Arc::new(FakeGroupApi::new());
    let directory = RoleDirectory::new(api.clone());
    directory.ensure_loaded().await.unwrap();

    api.set_roles(Err(status_error(503, "")));
    assert!(directory.refresh().await.is_err());

    // Previous snapshot still served
    assert_eq!(directory.len().await, standard_roles().len());
    assert_eq!(directory.lookup(10).await, Some(role_for(10)));
}

#[tokio::test]
async fn test_directory_failure_on_empty_cache_propagates() {
    let api = Arc::new(FakeGroupApi::new());
    api.set_roles(Err(status_error(500, "Internal")));
    let directory = RoleDirectory::new(api.clone());

    let result = directory.ensure_loaded().await;

    assert_eq!(result, Err(status_error(500, "Internal")));
    assert!(directory.is_empty().await);
}

#[tokio::test]
async fn test_directory_refresh_replaces_whole_map() {
    let api = Arc::new(FakeGroupApi::new());
    let directory = RoleDirectory::new(api.clone());
    directory.ensure_loaded().await.unwrap();
    let before = directory.snapshot().await;

    api.set_roles(Ok(vec![GroupRole {
        id: RoleId::new("new-5"),
        name: "Sergeant".to_string(),
        rank: 5,
    }]));
    assert_eq!(directory.refresh().await.unwrap(), 1);

    assert_eq!(directory.lookup(5).await, Some(RoleId::new("new-5")));
    assert_eq!(directory.lookup(1).await, None);
    // Earlier snapshot is unaffected by the swap
    assert_eq!(before.get(&1), Some(&role_for(1)));
}

#[tokio::test]
async fn test_directory_keys_on_rank_not_name() {
    let api = Arc::new(FakeGroupApi::new());
    api.set_roles(Ok(vec![
        GroupRole {
            id: RoleId::from(500),
            name: "5".to_string(),
            rank: 2,
        },
        GroupRole {
            id: RoleId::from(200),
            name: "Trooper".to_string(),
            rank: 5,
        },
    ]));
    let directory = RoleDirectory::new(api.clone());
    directory.ensure_loaded().await.unwrap();

    assert_eq!(directory.lookup(5).await, Some(RoleId::from(200)));
    assert_eq!(directory.lookup(2).await, Some(RoleId::from(500)));
}

#[tokio::test]
async fn test_concurrent_first_use_fetches_once() {
    let api = Arc::new(FakeGroupApi::new());
    let directory = Arc::new(RoleDirectory::new(api.clone()));

    let mut join_set = JoinSet::new();
    for _ in 0..8 {
        let directory = Arc::clone(&directory);
        join_set.spawn(async move { directory.ensure_loaded().await });
    }
    while let Some(result) = join_set.join_next().await {
        result.expect("Task panicked").unwrap();
    }

    assert_eq!(api.roles_calls.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Owner Guard
// =============================================================================

#[tokio::test]
async fn test_owner_guard_protects_owner_only() {
    let api = Arc::new(FakeGroupApi::new());
    let guard = OwnerGuard::new(api.clone());

    assert!(!guard.is_protected(OWNER_ID).await);
    guard.ensure_loaded().await;

    assert!(guard.is_protected(OWNER_ID).await);
    assert!(!guard.is_protected(OWNER_ID + 1).await);
}

#[tokio::test]
async fn test_owner_guard_never_refetches() {
    let api = Arc::new(FakeGroupApi::new());
    let guard = OwnerGuard::new(api.clone());

    guard.ensure_loaded().await;
    api.set_owner(Ok(Some(777)));
    guard.ensure_loaded().await;

    assert_eq!(guard.owner().await, Some(OWNER_ID));
    assert_eq!(api.owner_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_owner_guard_swallows_errors_and_ownerless_groups() {
    let api = Arc::new(FakeGroupApi::new());
    let guard = OwnerGuard::new(api.clone());

    api.set_owner(Err(status_error(500, "")));
    guard.ensure_loaded().await;
    assert_eq!(guard.owner().await, None);

    api.set_owner(Ok(None));
    guard.ensure_loaded().await;
    assert_eq!(guard.owner().await, None);

    assert_eq!(api.owner_calls.load(Ordering::SeqCst), 2);
}

// =============================================================================
// Membership Synchronizer
// =============================================================================

fn synchronizer(api: Arc<FakeGroupApi>, sleeper: Arc<RecordingSleeper>) -> MembershipSynchronizer {
    MembershipSynchronizer::new(api, RetryPolicy::new(3, Duration::from_millis(100)))
        .with_sleeper(sleeper)
}

#[tokio::test]
async fn test_sync_writes_when_different() {
    let api = Arc::new(FakeGroupApi::new());
    api.set_current_role(5, role_for(1));
    let sync = synchronizer(api.clone(), Arc::new(RecordingSleeper::default()));

    assert_eq!(sync.sync(5, &role_for(3)).await, Ok(SyncStatus::Applied));
    assert_eq!(api.writes(), vec![(5, role_for(3))]);
}

#[tokio::test]
async fn test_sync_writes_for_non_member() {
    let api = Arc::new(FakeGroupApi::new());
    let sync = synchronizer(api.clone(), Arc::new(RecordingSleeper::default()));

    assert_eq!(sync.current_role(5).await, Ok(None));
    assert_eq!(sync.sync(5, &role_for(1)).await, Ok(SyncStatus::Applied));
}

#[tokio::test]
async fn test_sync_noop_when_equal() {
    let api = Arc::new(FakeGroupApi::new());
    api.set_current_role(5, role_for(3));
    let sync = synchronizer(api.clone(), Arc::new(RecordingSleeper::default()));

    assert_eq!(sync.sync(5, &role_for(3)).await, Ok(SyncStatus::AlreadyCorrect));
    assert_eq!(api.write_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_sync_read_failure() {
    let api = Arc::new(FakeGroupApi::new());
    api.fail_current_role(status_error(500, "oops"));
    let sync = synchronizer(api.clone(), Arc::new(RecordingSleeper::default()));

    assert_eq!(
        sync.sync(5, &role_for(3)).await,
        Err(SyncError::CurrentRole(status_error(500, "oops")))
    );
}

#[tokio::test]
async fn test_sync_write_exhaustion() {
    let api = Arc::new(FakeGroupApi::new());
    api.script_writes(vec![
        Err(status_error(503, "a")),
        Err(status_error(503, "b")),
        Err(status_error(503, "c")),
    ]);
    let sleeper = Arc::new(RecordingSleeper::default());
    let sync = synchronizer(api.clone(), sleeper.clone());

    assert_eq!(
        sync.sync(5, &role_for(3)).await,
        Err(SyncError::Write(status_error(503, "c")))
    );
    assert_eq!(api.write_calls.load(Ordering::SeqCst), 3);
    assert_eq!(
        sleeper.delays(),
        vec![Duration::from_millis(100), Duration::from_millis(200)]
    );
}
