// ABOUTME: Tests for the global request scheduler under a paused tokio clock
// ABOUTME: Verifies the concurrency ceiling, dispatch spacing and FIFO hand-off over dispatch logs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fooddata_mcp_server::external::RequestLimiter;
use tokio::time::Instant;

struct DispatchLog {
    running: AtomicUsize,
    peak: AtomicUsize,
    dispatches: Mutex<Vec<(usize, Instant)>>,
}

impl DispatchLog {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            dispatches: Mutex::new(Vec::new()),
        })
    }

    async fn run(&self, caller: usize, work: Duration) {
        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        self.dispatches
            .lock()
            .unwrap()
            .push((caller, Instant::now()));
        tokio::time::sleep(work).await;
        self.running.fetch_sub(1, Ordering::SeqCst);
    }

    fn times(&self) -> Vec<Instant> {
        let mut times: Vec<Instant> = self.dispatches.lock().unwrap().iter().map(|(_, t)| *t).collect();
        times.sort();
        times
    }

    fn order(&self) -> Vec<usize> {
        self.dispatches.lock().unwrap().iter().map(|(caller, _)| *caller).collect()
    }
}

async fn run_callers(limiter: &RequestLimiter, log: &Arc<DispatchLog>, callers: usize) {
    let mut handles = Vec::with_capacity(callers);
    for caller in 0..callers {
        let limiter = limiter.clone();
        let log = Arc::clone(log);
        let work = Duration::from_millis(50 + 175 * (caller as u64 % 4));
        handles.push(tokio::spawn(async move {
            limiter.schedule(|| log.run(caller, work)).await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_ceiling_and_spacing_hold_over_dispatch_log() {
    let min_interval = Duration::from_millis(400);
    for max_concurrent in [1, 2, 3] {
        let limiter = RequestLimiter::new(max_concurrent, min_interval);
        let log = DispatchLog::new();

        run_callers(&limiter, &log, 12).await;

        assert!(log.peak.load(Ordering::SeqCst) <= max_concurrent);
        let times = log.times();
        assert_eq!(times.len(), 12);
        for pair in times.windows(2) {
            assert!(
                pair[1] - pair[0] >= min_interval,
                "dispatches {:?} apart with max_concurrent {max_concurrent}",
                pair[1] - pair[0]
            );
        }
        assert_eq!(limiter.active(), 0);
        assert_eq!(limiter.queued(), 0);
    }
}

#[tokio::test(start_paused = true)]
async fn test_spacing_applies_to_sequential_calls() {
    let limiter = RequestLimiter::new(4, Duration::from_millis(400));
    let started = Instant::now();
    for _ in 0..3 {
        limiter.schedule(|| async {}).await;
    }
    assert_eq!(started.elapsed(), Duration::from_millis(800));
}

#[tokio::test(start_paused = true)]
async fn test_idle_limiter_dispatches_immediately() {
    let limiter = RequestLimiter::new(1, Duration::from_millis(400));
    limiter.schedule(|| async {}).await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    let started = Instant::now();
    limiter.schedule(|| async {}).await;
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_waiters_are_served_in_arrival_order() {
    let limiter = RequestLimiter::new(1, Duration::ZERO);
    let log = DispatchLog::new();
    let held = limiter.acquire().await;

    let mut handles = Vec::new();
    for caller in 0..6 {
        let task_limiter = limiter.clone();
        let task_log = Arc::clone(&log);
        handles.push(tokio::spawn(async move {
            task_limiter
                .schedule(|| task_log.run(caller, Duration::from_millis(10)))
                .await;
        }));
        while limiter.queued() < caller + 1 {
            tokio::task::yield_now().await;
        }
    }

    drop(held);

    // Arrives after capacity frees up but must still queue behind the others
    let late_log = Arc::clone(&log);
    limiter
        .schedule(|| late_log.run(99, Duration::from_millis(10)))
        .await;
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(log.order(), vec![0, 1, 2, 3, 4, 5, 99]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_operation_releases_slot() {
    let limiter = RequestLimiter::new(1, Duration::ZERO);
    let result: Result<(), &str> = limiter.schedule(|| async { Err("boom") }).await;
    assert!(result.is_err());
    assert_eq!(limiter.active(), 0);

    let value = tokio::time::timeout(Duration::from_secs(1), limiter.schedule(|| async { 7 }))
        .await
        .unwrap();
    assert_eq!(value, 7);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_operation_releases_slot() {
    let limiter = RequestLimiter::new(1, Duration::ZERO);
    let cancelled = tokio::time::timeout(
        Duration::from_millis(100),
        limiter.schedule(|| tokio::time::sleep(Duration::from_secs(60))),
    )
    .await;
    assert!(cancelled.is_err());
    assert_eq!(limiter.active(), 0);
}

#[test]
fn test_zero_concurrency_is_clamped() {
    let limiter = RequestLimiter::new(0, Duration::ZERO);
    assert_eq!(limiter.max_concurrent(), 1);
    assert_eq!(RequestLimiter::default().min_interval(), Duration::from_millis(400));
}
