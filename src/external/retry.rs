// ABOUTME: Retry policy with jittered exponential backoff for upstream calls
// ABOUTME: Decides retry vs. fail from the error classification and computes the delay
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::future::Future;
use std::time::Duration;

use fooddata_core::constants::limits::{
    DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BASE_DELAY_MS, JITTER_MAX, JITTER_MIN,
};
use fooddata_core::errors::UpstreamError;
use rand::Rng;
use tracing::warn;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, before jitter
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy
    #[must_use]
    pub const fn new(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
        }
    }

    /// Policy that never retries
    #[must_use]
    pub const fn none() -> Self {
        Self::new(0, 0)
    }

    /// Whether attempt `attempt_index` (0-based) may be followed by another
    #[must_use]
    pub const fn should_retry(&self, error: &UpstreamError, attempt_index: u32) -> bool {
        should_retry(error, attempt_index, self.max_retries)
    }

    /// Jittered delay before retry number `attempt_index`
    #[must_use]
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        Duration::from_millis(compute_delay(self.base_delay_ms, attempt_index))
    }
}

/// Retry only retryable errors, and only while `attempt_index < max_retries`
#[must_use]
pub const fn should_retry(error: &UpstreamError, attempt_index: u32, max_retries: u32) -> bool {
    attempt_index < max_retries && error.is_retryable()
}

/// `base_delay_ms * 2^attempt_index`, scaled by a random factor in `[0.5, 1.5)`
#[must_use]
pub fn compute_delay(base_delay_ms: u64, attempt_index: u32) -> u64 {
    let jitter = rand::thread_rng().gen_range(JITTER_MIN..JITTER_MAX);
    jittered_delay(base_delay_ms, attempt_index, jitter)
}

/// Deterministic core of [`compute_delay`] for a given jitter factor.
///
/// Rounded to the nearest millisecond; saturates at `u64::MAX`.
#[must_use]
pub fn jittered_delay(base_delay_ms: u64, attempt_index: u32, jitter: f64) -> u64 {
    let exponent = i32::try_from(attempt_index).unwrap_or(i32::MAX);
    let scaled = (base_delay_ms as f64) * 2_f64.powi(exponent) * jitter;
    // Float-to-int `as` saturates, which is the overflow behavior we want
    scaled.round() as u64
}

/// Run `operation` until it succeeds, fails permanently, or the retry budget is spent.
///
/// Any `Retry-After` hint on the error is logged but does not change the delay.
///
/// # Errors
///
/// Returns the last error produced by `operation`
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut attempt: F,
) -> Result<T, UpstreamError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let mut attempt_index = 0;
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(error) if policy.should_retry(&error, attempt_index) => {
                let delay = policy.delay_for(attempt_index);
                warn!(
                    operation,
                    attempt = attempt_index + 1,
                    max_retries = policy.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    status = ?error.http_status(),
                    retry_after = ?error.retry_after(),
                    error = %error,
                    "Retrying upstream call"
                );
                tokio::time::sleep(delay).await;
                attempt_index += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jittered_delay_scaling() {
        assert_eq!(jittered_delay(750, 0, 1.0), 750);
        assert_eq!(jittered_delay(750, 1, 1.0), 1500);
        assert_eq!(jittered_delay(750, 2, 0.5), 1500);
        assert_eq!(jittered_delay(100, 3, 1.25), 1000);
    }

    #[test]
    fn test_jittered_delay_saturates() {
        assert_eq!(jittered_delay(u64::MAX, 63, 1.4), u64::MAX);
    }

    #[test]
    fn test_policy_never_retries_permanent_errors() {
        let policy = RetryPolicy::default();
        let bad_request = UpstreamError::from_status(400, "bad", None);
        assert!(!policy.should_retry(&bad_request, 0));
        let throttled = UpstreamError::from_status(429, "slow", None);
        assert!(policy.should_retry(&throttled, 0));
        assert!(policy.should_retry(&throttled, 1));
        assert!(!policy.should_retry(&throttled, 2));
    }
}
