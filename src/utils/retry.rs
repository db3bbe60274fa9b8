//! Bounded retry with exponential backoff
//!
//! Wraps one gateway call. Only retryable error codes (rate limit, timeout,
//! connection) are retried; everything else returns immediately.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::config::RetryPolicy;
use crate::models::errors::{AppResult, ErrorCode};
use crate::utils::constants::{MAX_RETRY_DELAY_MS, RETRY_JITTER_FACTOR};
use crate::utils::jitter::JitterSource;

/// Backoff before retry number `attempt` (1-indexed, attempt 1 is the first retry)
///
/// `base * 2^(attempt-1)`, capped, then scaled by a ±20% jitter.
pub fn backoff_delay(policy: &RetryPolicy, attempt: u32, jitter: &dyn JitterSource) -> Duration {
    let base_ms = policy.base_delay.as_millis() as u64;
    let exp_ms = base_ms
        .saturating_mul(2_u64.saturating_pow(attempt.saturating_sub(1)))
        .min(MAX_RETRY_DELAY_MS);
    let factor = jitter.range(1.0 - RETRY_JITTER_FACTOR, 1.0 + RETRY_JITTER_FACTOR);
    Duration::from_millis((exp_ms as f64 * factor).round() as u64)
}

/// Run `op` up to `policy.max_attempts` times
pub async fn with_retry<F, Fut, T>(
    label: &str,
    policy: &RetryPolicy,
    jitter: &dyn JitterSource,
    op: F,
) -> AppResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                if e.code == ErrorCode::RpcRateLimited {
                    warn!("⏳ {} rate limited, backing off (attempt {}/{})", label, attempt, max_attempts);
                }
                let delay = backoff_delay(policy, attempt, jitter);
                debug!(
                    "⏳ Retry {}/{} for {} after {}ms: {}",
                    attempt + 1,
                    max_attempts,
                    label,
                    delay.as_millis(),
                    e
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::AppError;
    use crate::utils::jitter::FixedJitter;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_backoff_doubles_and_jitters() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
        };
        // unit 0.5 maps to a factor of exactly 1.0
        let mid = FixedJitter(0.5);
        assert_eq!(backoff_delay(&policy, 1, &mid), Duration::from_millis(250));
        assert_eq!(backoff_delay(&policy, 2, &mid), Duration::from_millis(500));
        assert_eq!(backoff_delay(&policy, 3, &mid), Duration::from_millis(1000));

        let low = FixedJitter::zero();
        assert_eq!(backoff_delay(&policy, 1, &low), Duration::from_millis(200));
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 20,
            base_delay: Duration::from_millis(1_000),
        };
        let delay = backoff_delay(&policy, 15, &FixedJitter(0.5));
        assert_eq!(delay, Duration::from_millis(MAX_RETRY_DELAY_MS));
    }

    #[tokio::test]
    async fn test_retries_rate_limited_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = with_retry("test", &fast_policy(), &FixedJitter::zero(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(AppError::rpc_rate_limited())
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: AppResult<()> = with_retry("test", &fast_policy(), &FixedJitter::zero(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AppError::rpc_timeout("slow")) }
        })
        .await;

        assert_eq!(result.unwrap_err().code, ErrorCode::RpcTimeout);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_fast() {
        let calls = AtomicU32::new(0);
        let result: AppResult<()> = with_retry("test", &fast_policy(), &FixedJitter::zero(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AppError::token_not_found("gone")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
