//! Promotion pipeline
//!
//! One pass per inbound update:
//! 1. Authenticate the caller's shared secret
//! 2. Skip if the caller's XP has not finished loading
//! 3. Validate user id and XP
//! 4. Load the role directory (required) and group owner (best-effort)
//! 5. Skip the group owner
//! 6. Resolve XP → capped rank → role id
//! 7. Sync the membership (idempotent, retried)
//!
//! Steps 6-7 run under a per-user lease. Every path returns a
//! [`PromotionOutcome`]; panics inside the pipeline are caught at
//! [`PromotionPipeline::submit`] and reported as `InternalError`.

use futures::FutureExt;
use rankbot_common::api::{
    validate_secret, ErrorKind, PromotionOutcome, PromotionRequest, SkipReason,
};
use rankbot_common::TierTable;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::lease::UserLeases;
use crate::membership::{MembershipSynchronizer, SyncError, SyncStatus};
use crate::owner::OwnerGuard;
use crate::remote::{GroupApi, RemoteError};
use crate::retry::{RetryPolicy, Sleeper};
use crate::roles::RoleDirectory;

/// Process-scoped promotion context
///
/// Owns the tier table and both caches. Independent instances share no
/// state, so tests can run several side by side.
pub struct PromotionPipeline {
    shared_secret: String,
    tiers: TierTable,
    roles: RoleDirectory,
    owner: OwnerGuard,
    membership: MembershipSynchronizer,
    leases: UserLeases,
}

impl PromotionPipeline {
    pub fn new(
        api: Arc<dyn GroupApi>,
        tiers: TierTable,
        retry: RetryPolicy,
        shared_secret: impl Into<String>,
    ) -> Self {
        Self {
            shared_secret: shared_secret.into(),
            tiers,
            roles: RoleDirectory::new(Arc::clone(&api)),
            owner: OwnerGuard::new(Arc::clone(&api)),
            membership: MembershipSynchronizer::new(api, retry),
            leases: UserLeases::new(),
        }
    }

    /// Replace the retry backoff sleeper
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.membership = self.membership.with_sleeper(sleeper);
        self
    }

    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }

    pub fn roles(&self) -> &RoleDirectory {
        &self.roles
    }

    pub fn owner(&self) -> &OwnerGuard {
        &self.owner
    }

    pub fn leases(&self) -> &UserLeases {
        &self.leases
    }

    /// Eagerly load roles and owner at startup
    ///
    /// Role failures are returned so the caller can log them; the next
    /// request retries the load either way.
    pub async fn preload(&self) -> Result<usize, RemoteError> {
        let count = self.roles.refresh().await?;
        self.owner.ensure_loaded().await;
        Ok(count)
    }

    /// Process one progression update
    pub async fn submit(&self, request: PromotionRequest) -> PromotionOutcome {
        let span = info_span!("promotion", user_id = %request.user_id);

        let run = self.run(request).instrument(span.clone());
        let outcome = match AssertUnwindSafe(run).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                PromotionOutcome::failed(ErrorKind::InternalError, panic_message(panic.as_ref()))
            }
        };

        span.in_scope(|| log_outcome(&outcome));
        outcome
    }

    async fn run(&self, request: PromotionRequest) -> PromotionOutcome {
        if let Err(e) = validate_secret(request.secret.as_deref(), &self.shared_secret) {
            warn!(reason = %e, "Rejected promotion request");
            return PromotionOutcome::failed(ErrorKind::Unauthorized, "Invalid secret");
        }

        // An unloaded score would resolve to the lowest rank and demote
        if !request.is_loaded() {
            return PromotionOutcome::skipped(SkipReason::NotLoaded);
        }

        let Some(user_id) = request.parsed_user_id() else {
            return PromotionOutcome::failed(ErrorKind::BadInput, "Bad userId");
        };
        let Some(xp) = request.parsed_xp() else {
            return PromotionOutcome::failed(ErrorKind::BadInput, "Bad xp");
        };

        if let Err(e) = self.roles.ensure_loaded().await {
            return PromotionOutcome::failed(
                ErrorKind::UpstreamUnavailable,
                format!("Failed to load group roles: {}", e.detail()),
            );
        }
        self.owner.ensure_loaded().await;

        if self.owner.is_protected(user_id).await {
            info!(user_id, "Skipping group owner");
            return PromotionOutcome::skipped(SkipReason::GroupOwner);
        }

        let _lease = self.leases.acquire(user_id).await;

        let rank = self.tiers.resolve_rank(xp);
        debug!(user_id, xp, rank, "Resolved target rank");

        let Some(role_id) = self.roles.lookup(rank).await else {
            return PromotionOutcome::Failed {
                kind: ErrorKind::RoleNotFound,
                detail: format!("Role not found for target rank number {}", rank),
                rank: Some(rank),
            };
        };

        match self.membership.sync(user_id, &role_id).await {
            Ok(SyncStatus::Applied) => PromotionOutcome::Applied { rank },
            Ok(SyncStatus::AlreadyCorrect) => PromotionOutcome::Skipped {
                reason: SkipReason::AlreadyCorrect,
                rank: Some(rank),
            },
            Err(SyncError::CurrentRole(e)) => PromotionOutcome::Failed {
                kind: ErrorKind::UpstreamUnavailable,
                detail: format!("Failed to read current role: {}", e.detail()),
                rank: Some(rank),
            },
            Err(SyncError::Write(e)) => PromotionOutcome::Failed {
                kind: ErrorKind::UpstreamError,
                detail: e.detail(),
                rank: Some(rank),
            },
        }
    }
}

fn log_outcome(outcome: &PromotionOutcome) {
    match outcome {
        PromotionOutcome::Applied { rank } => info!(rank, "Promotion applied"),
        PromotionOutcome::Skipped { reason, rank } => {
            debug!(reason = ?reason, rank = ?rank, "Promotion skipped")
        }
        PromotionOutcome::Failed { kind, detail, rank } => match kind {
            ErrorKind::UpstreamError
            | ErrorKind::UpstreamUnavailable
            | ErrorKind::InternalError => {
                error!(kind = ?kind, rank = ?rank, detail = %detail, "Promotion failed")
            }
            _ => warn!(kind = ?kind, rank = ?rank, detail = %detail, "Promotion rejected"),
        },
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
