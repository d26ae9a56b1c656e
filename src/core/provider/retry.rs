//! Backoff retry wrapper for provider calls.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use super::{ProviderError, ProviderResult};

/// How often and how patiently a failed provider call is retried.
///
/// The first retry waits `base_delay`, and every further retry doubles the
/// wait. `max_retries` counts retries, not attempts: a policy of 2 makes at
/// most 3 calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay applied after the `retry`-th failure (1-based).
    fn backoff_delay(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
    }
}

/// Runs `op` until it succeeds, fails fatally, or the policy is exhausted.
///
/// Only errors classified as transient by [`ProviderError::is_transient`]
/// are retried. The last error is returned as-is once retries run out.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    op_name: &str,
    mut op: F,
) -> ProviderResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", op_name, attempt);
                }
                return Ok(value);
            }
            Err(err) if err.is_transient() && attempt <= policy.max_retries => {
                let delay = policy.backoff_delay(attempt);
                warn!(
                    "{} attempt {} failed ({}), retrying in {:?}",
                    op_name, attempt, err, delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                warn!("{} failed after {} attempt(s): {}", op_name, attempt, err);
                return Err(err);
            }
        }
    }
}
