// ABOUTME: Global request scheduler capping concurrency and spacing dispatches apart
// ABOUTME: FIFO wait queue with direct slot hand-off so no waiter is starved
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use fooddata_core::constants::limits::{DEFAULT_MAX_CONCURRENT, DEFAULT_MIN_INTERVAL_MS};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::debug;

/// Scheduler shared by every call through one client.
///
/// At most `max_concurrent` operations run at once and no two dispatches are
/// closer than `min_interval`. Callers that find the concurrency budget
/// exhausted park on a FIFO queue; a finishing operation hands its slot
/// straight to the head of that queue, so late arrivals cannot overtake it.
/// Cloning shares the same budget.
#[derive(Clone)]
pub struct RequestLimiter {
    inner: Arc<LimiterInner>,
}

struct LimiterInner {
    max_concurrent: usize,
    min_interval: Duration,
    state: Mutex<LimiterState>,
}

struct LimiterState {
    active: usize,
    last_dispatch: Option<Instant>,
    waiters: VecDeque<oneshot::Sender<Slot>>,
}

/// One unit of concurrency. Dropping it releases the unit, wherever it is:
/// held by a running operation, or stranded in the channel of a waiter that
/// gave up.
struct Slot {
    inner: Arc<LimiterInner>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        self.inner.release();
    }
}

/// Proof of dispatch. The slot is released when this is dropped.
pub struct LimiterPermit {
    _slot: Slot,
}

impl Default for RequestLimiter {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_CONCURRENT,
            Duration::from_millis(DEFAULT_MIN_INTERVAL_MS),
        )
    }
}

impl RequestLimiter {
    /// Create a scheduler. A `max_concurrent` of zero is treated as one.
    #[must_use]
    pub fn new(max_concurrent: usize, min_interval: Duration) -> Self {
        Self {
            inner: Arc::new(LimiterInner {
                max_concurrent: max_concurrent.max(1),
                min_interval,
                state: Mutex::new(LimiterState {
                    active: 0,
                    last_dispatch: None,
                    waiters: VecDeque::new(),
                }),
            }),
        }
    }

    /// Concurrency ceiling
    #[must_use]
    pub fn max_concurrent(&self) -> usize {
        self.inner.max_concurrent
    }

    /// Minimum spacing between dispatches
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.inner.min_interval
    }

    /// Operations currently holding a slot
    #[must_use]
    pub fn active(&self) -> usize {
        self.inner.lock_state().active
    }

    /// Callers parked on the wait queue
    #[must_use]
    pub fn queued(&self) -> usize {
        self.inner.lock_state().waiters.len()
    }

    /// Wait for a concurrency slot and a dispatch time, in arrival order
    pub async fn acquire(&self) -> LimiterPermit {
        let slot = self.acquire_slot().await;
        let dispatch_at = self.inner.reserve_dispatch();
        if dispatch_at > Instant::now() {
            tokio::time::sleep_until(dispatch_at).await;
        }
        LimiterPermit { _slot: slot }
    }

    /// Run `operation` under the scheduler; the slot is released on every exit path
    pub async fn schedule<T, F, Fut>(&self, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _permit = self.acquire().await;
        operation().await
    }

    async fn acquire_slot(&self) -> Slot {
        loop {
            let receiver = {
                let mut state = self.inner.lock_state();
                if state.waiters.is_empty() && state.active < self.inner.max_concurrent {
                    state.active += 1;
                    return Slot {
                        inner: Arc::clone(&self.inner),
                    };
                }
                let (sender, receiver) = oneshot::channel();
                state.waiters.push_back(sender);
                debug!(
                    active = state.active,
                    queued = state.waiters.len(),
                    "Upstream call queued for a scheduler slot"
                );
                receiver
            };

            // A closed channel means the limiter is being torn down; re-queue
            if let Ok(slot) = receiver.await {
                return slot;
            }
        }
    }
}

impl LimiterInner {
    fn lock_state(&self) -> MutexGuard<'_, LimiterState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Request limiter lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Claim the next dispatch time at least `min_interval` after the previous one
    fn reserve_dispatch(&self) -> Instant {
        let now = Instant::now();
        let mut state = self.lock_state();
        let dispatch_at = state
            .last_dispatch
            .map_or(now, |last| (last + self.min_interval).max(now));
        state.last_dispatch = Some(dispatch_at);
        dispatch_at
    }

    /// Hand the slot to the oldest waiter, or return it to the pool
    fn release(self: &Arc<Self>) {
        let waiter = {
            let mut state = self.lock_state();
            match state.waiters.pop_front() {
                Some(waiter) => waiter,
                None => {
                    state.active = state.active.saturating_sub(1);
                    return;
                }
            }
        };
        // If the waiter already gave up, the returned slot drops here and
        // this runs again for the next waiter
        let _ = waiter.send(Slot {
            inner: Arc::clone(self),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_release_returns_capacity() {
        let limiter = RequestLimiter::new(2, Duration::ZERO);
        let first = limiter.acquire().await;
        let second = limiter.acquire().await;
        assert_eq!(limiter.active(), 2);
        drop(first);
        assert_eq!(limiter.active(), 1);
        drop(second);
        assert_eq!(limiter.active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_waiter_does_not_leak_slot() {
        let limiter = RequestLimiter::new(1, Duration::ZERO);
        let held = limiter.acquire().await;

        let abandoned = {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                let _permit = limiter.acquire().await;
            })
        };
        tokio::task::yield_now().await;
        assert_eq!(limiter.queued(), 1);
        abandoned.abort();
        let _ = abandoned.await;

        drop(held);
        assert_eq!(limiter.active(), 0);
        let _again = limiter.acquire().await;
        assert_eq!(limiter.active(), 1);
    }
}
