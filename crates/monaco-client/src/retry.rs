//! Retry with exponential backoff for idempotent calls.
//!
//! Only transient remote failures (429/503) are retried, honoring a
//! server-provided `Retry-After` hint when present. POSTs are never routed
//! through this helper; a create that fails is terminal.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Error, Result};

/// Bounds for retrying idempotent calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Backoff before the first retry; doubles per attempt.
    pub initial_backoff: Duration,
    /// Upper bound for any single backoff.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries. Used for non-idempotent calls.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// The backoff before the given retry (0-indexed), capped at the
    /// policy's maximum.
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2_u32.saturating_pow(retry);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Runs an idempotent operation, retrying transient failures.
///
/// # Errors
///
/// Returns the last error once attempts are exhausted, the error itself for
/// non-transient failures, and [`Error::Cancelled`] when the token fires
/// while backing off.
pub async fn retry_idempotent<T, F, Fut>(
    policy: RetryPolicy,
    cancel: &CancellationToken,
    operation_name: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                attempt += 1;
                if !error.is_transient() || attempt >= policy.max_attempts {
                    return Err(error);
                }
                let backoff = error
                    .retry_after()
                    .unwrap_or_else(|| policy.backoff(attempt - 1));
                debug!(
                    operation = operation_name,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "transient failure, backing off"
                );
                tokio::select! {
                    () = cancel.cancelled() => return Err(Error::Cancelled),
                    () = tokio::time::sleep(backoff) => {}
                }
            }
        }
    }
}
