//! Retry with exponential back-off and jitter.
//!
//! [`retry_with_backoff`] treats every error as transient. Use
//! [`retry_with_backoff_if`] when some errors (e.g.
//! [`SessionError::UnsupportedEnvironment`](crate::error::SessionError::UnsupportedEnvironment))
//! must stop immediately.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use nzhp_core::AppConfig;

/// Attempt budget and back-off curve for one retried operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_attempts: config.retry_max_attempts,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
            backoff_factor: config.retry_backoff_factor,
        }
    }

    /// Delay before jitter after the zero-based failed `attempt`:
    /// `min(base_delay * backoff_factor^attempt, max_delay)`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = (self.base_delay.as_secs_f64() * self.backoff_factor.powi(exponent))
            .min(self.max_delay.as_secs_f64());
        Duration::try_from_secs_f64(secs).unwrap_or(self.max_delay)
    }
}

/// Runs `operation` until it succeeds or the policy's attempts run out.
///
/// Every error is retried. After failed attempt `n` (zero-based) the call
/// sleeps [`RetryPolicy::delay_for`]`(n)` plus a jitter drawn uniformly from
/// `[0.1, 0.5]` times that delay. The last error is returned once attempts
/// are exhausted.
///
/// # Errors
///
/// Returns the error from the final attempt.
pub async fn retry_with_backoff<T, E, F, Fut>(policy: &RetryPolicy, operation: F) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_with_backoff_if(policy, |_| true, operation).await
}

/// Like [`retry_with_backoff`], but errors for which `is_retryable` returns
/// `false` are returned immediately without sleeping.
///
/// # Errors
///
/// Returns the first non-retryable error, or the error from the final attempt.
pub async fn retry_with_backoff_if<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    is_retryable: P,
    mut operation: F,
) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retryable(&err) || attempt + 1 >= max_attempts {
                    return Err(err);
                }

                let delay = policy.delay_for(attempt);
                let jitter = delay.mul_f64(0.1 + 0.4 * rand::random::<f64>());
                let total = delay + jitter;
                #[allow(clippy::cast_possible_truncation)]
                let delay_ms = total.as_millis() as u64;
                tracing::warn!(
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms,
                    error = %err,
                    "attempt failed, retrying after back-off"
                );
                tokio::time::sleep(total).await;
                attempt += 1;
            }
        }
    }
}
