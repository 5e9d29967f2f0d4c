// ABOUTME: Tests for the upstream retry policy and backoff delay computation
// ABOUTME: Covers retry decisions per error class, delay bounds and the async retry loop
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use fooddata_mcp_server::errors::UpstreamError;
use fooddata_mcp_server::external::retry::{
    compute_delay, jittered_delay, run_with_retry, should_retry,
};
use fooddata_mcp_server::external::RetryPolicy;
use proptest::prelude::*;

fn retryable_errors() -> Vec<UpstreamError> {
    vec![
        UpstreamError::from_status(429, "Too Many Requests", None),
        UpstreamError::from_status(500, "Internal Server Error", None),
        UpstreamError::from_status(503, "Service Unavailable", None),
        UpstreamError::timeout(30),
        UpstreamError::transport("connection reset"),
    ]
}

fn permanent_errors() -> Vec<UpstreamError> {
    vec![
        UpstreamError::from_status(400, "Bad Request", None),
        UpstreamError::from_status(403, "Forbidden", None),
        UpstreamError::from_status(404, "Not Found", None),
        UpstreamError::malformed("not json", Some("<html>".to_owned())),
        UpstreamError::validation("Search query cannot be empty"),
    ]
}

#[test]
fn test_retryable_errors_retry_until_limit() {
    for error in retryable_errors() {
        assert!(should_retry(&error, 0, 2), "{error}");
        assert!(should_retry(&error, 1, 2), "{error}");
        assert!(!should_retry(&error, 2, 2), "{error}");
    }
}

#[test]
fn test_permanent_errors_never_retry() {
    for error in permanent_errors() {
        for attempt in 0..5 {
            assert!(!should_retry(&error, attempt, 10), "{error}");
        }
    }
}

#[test]
fn test_default_policy() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_retries, 2);
    assert_eq!(policy.base_delay_ms, 750);
    assert!(!RetryPolicy::none().should_retry(&UpstreamError::timeout(1), 0));
}

#[test]
fn test_jitter_extremes() {
    assert_eq!(jittered_delay(750, 0, 0.5), 375);
    assert_eq!(jittered_delay(750, 1, 1.0), 1500);
    assert_eq!(jittered_delay(750, 2, 1.5), 4500);
    assert_eq!(jittered_delay(3, 0, 0.5), 2);
}

proptest! {
    #[test]
    fn prop_delay_within_jitter_window(base in 1u64..5_000, attempt in 0u32..8) {
        let nominal = base * 2u64.pow(attempt);
        let delay = compute_delay(base, attempt);
        // Rounding to the nearest millisecond can land half a unit either side
        prop_assert!(delay * 2 + 1 >= nominal, "delay {} below window for {}", delay, nominal);
        prop_assert!(delay * 2 <= nominal * 3 + 1, "delay {} above window for {}", delay, nominal);
    }

    #[test]
    fn prop_permanent_status_never_retries(status in 400u16..500, attempt in 0u32..10) {
        prop_assume!(status != 429);
        let error = UpstreamError::from_status(status, "client error", None);
        prop_assert!(!should_retry(&error, attempt, 10));
    }
}

#[tokio::test(start_paused = true)]
async fn test_retry_loop_recovers_from_transient_failures() {
    let calls = AtomicU32::new(0);
    let policy = RetryPolicy::new(2, 750);
    let started = tokio::time::Instant::now();

    let result = run_with_retry(&policy, "foods", || {
        let call = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if call < 2 {
                Err(UpstreamError::from_status(503, "Service Unavailable", None))
            } else {
                Ok(call)
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // 750 * [0.5, 1.5) + 1500 * [0.5, 1.5)
    let waited = started.elapsed();
    assert!(waited >= Duration::from_millis(1125), "{waited:?}");
    assert!(waited <= Duration::from_millis(3375), "{waited:?}");
}

#[tokio::test(start_paused = true)]
async fn test_retry_loop_surfaces_last_error_after_limit() {
    let calls = AtomicU32::new(0);
    let policy = RetryPolicy::new(2, 10);

    let error = run_with_retry(&policy, "search", || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err::<(), _>(UpstreamError::from_status(429, "Too Many Requests", None)) }
    })
    .await
    .unwrap_err();

    assert_eq!(error.http_status(), Some(429));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_retry_loop_does_not_retry_permanent_errors() {
    let calls = AtomicU32::new(0);
    let policy = RetryPolicy::new(5, 10);

    let error = run_with_retry(&policy, "foods", || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err::<(), _>(UpstreamError::from_status(400, "Bad Request", None)) }
    })
    .await
    .unwrap_err();

    assert_eq!(error.http_status(), Some(400));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_hint_does_not_change_delay() {
    let calls = AtomicU32::new(0);
    let policy = RetryPolicy::new(1, 100);
    let started = tokio::time::Instant::now();

    let _ = run_with_retry(&policy, "foods", || {
        calls.fetch_add(1, Ordering::SeqCst);
        async {
            Err::<(), _>(
                UpstreamError::from_status(429, "Too Many Requests", None)
                    .with_retry_after("3600", Some(3_600_000)),
            )
        }
    })
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(started.elapsed() < Duration::from_secs(1));
}
