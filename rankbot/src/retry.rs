//! Bounded retry for group membership writes
//!
//! **Algorithm:**
//! 1. Attempt operation
//! 2. If successful, return result
//! 3. If the failure is transient (HTTP 429, HTTP 5xx, or a lock-contention
//!    marker in the body) and attempts remain: log WARN, wait, retry
//! 4. Otherwise return the error immediately
//!
//! **Backoff Strategy:** linear. The wait after attempt `n` is
//! `base_delay * n`, so with the defaults (250ms, 4 attempts) the waits are
//! 250ms, 500ms, 750ms.
//!
//! Waiting goes through [`Sleeper`] so tests can record delays instead of
//! sleeping.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use crate::remote::RemoteError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(250);

/// Body markers the group service uses for retryable contention
pub const TRANSIENT_MARKERS: &[&str] = &["FailedToAcquireLock", "TooManyRequests"];

/// Suspends the current task between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real wall-clock sleeper
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Retry limits and backoff for membership writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first (at least 1)
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Wait after the given (1-based) failed attempt
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Whether a failed write may be retried
    ///
    /// Network failures carry no response and are not retried.
    pub fn is_transient(error: &RemoteError) -> bool {
        match error {
            RemoteError::Status { status, body } => {
                *status == 429
                    || *status >= 500
                    || TRANSIENT_MARKERS.iter().any(|marker| body.contains(marker))
            }
            RemoteError::Network(_) | RemoteError::Parse(_) => false,
        }
    }

    /// Run `operation` until it succeeds, fails fatally, or attempts run out.
    ///
    /// On exhaustion the last error is returned.
    pub async fn execute<F, Fut, T>(
        &self,
        sleeper: &dyn Sleeper,
        operation_name: &str,
        mut operation: F,
    ) -> Result<T, RemoteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        tracing::info!(
                            operation = operation_name,
                            attempt,
                            "Operation succeeded after retry"
                        );
                    }
                    return Ok(result);
                }
                Err(err) => {
                    if !Self::is_transient(&err) {
                        tracing::warn!(
                            operation = operation_name,
                            attempt,
                            error = %err,
                            "Operation failed with non-retryable error"
                        );
                        return Err(err);
                    }

                    if attempt >= max_attempts {
                        tracing::error!(
                            operation = operation_name,
                            attempt,
                            error = %err,
                            "Operation failed: retry attempts exhausted"
                        );
                        return Err(err);
                    }

                    let delay = self.delay_after(attempt);
                    tracing::warn!(
                        operation = operation_name,
                        attempt,
                        backoff_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient failure, will retry after backoff"
                    );

                    sleeper.sleep(delay).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}
