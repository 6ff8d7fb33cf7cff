//! Concurrency and spacing gate
//!
//! Bounds the number of in-flight calls to one upstream and keeps dispatch
//! starts at least `min_interval` apart across every caller. Both waits are
//! first-come-first-served: tokio's semaphore and mutex queue waiters in
//! arrival order.

use crate::error::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Gate guarding one upstream dependency.
#[derive(Debug)]
pub struct RateLimitedGate {
    max_concurrency: usize,
    min_interval: Duration,
    semaphore: Arc<Semaphore>,
    last_dispatch: Mutex<Option<Instant>>,
}

impl RateLimitedGate {
    /// Create a gate. `max_concurrency` is clamped to at least 1; a zero
    /// `min_interval` disables spacing.
    #[must_use]
    pub fn new(max_concurrency: usize, min_interval: Duration) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            max_concurrency,
            min_interval,
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            last_dispatch: Mutex::new(None),
        }
    }

    /// Configured slot count
    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Configured dispatch spacing
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Slots currently free
    #[must_use]
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait for a slot and for the dispatch spacing, then claim a dispatch.
    ///
    /// The slot is held by the returned permit and released when it drops,
    /// so it is freed on every exit path. If `cancel` fires first the call
    /// returns [`Error::Cancelled`] holding nothing.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<GatePermit> {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            permit = self.semaphore.clone().acquire_owned() => {
                permit.map_err(|_| Error::Cancelled)?
            }
        };

        if !self.min_interval.is_zero() {
            // Holding the lock across the sleep serializes spacing waits, so
            // the next waiter measures from this dispatch.
            let mut last = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                last = self.last_dispatch.lock() => last,
            };
            if let Some(previous) = *last {
                let ready_at = previous + self.min_interval;
                if ready_at > Instant::now() {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(Error::Cancelled),
                        () = sleep_until(ready_at) => {}
                    }
                }
            }
            *last = Some(Instant::now());
        }

        debug!(
            available = self.semaphore.available_permits(),
            max = self.max_concurrency,
            "Gate slot acquired"
        );
        Ok(GatePermit { _permit: permit })
    }
}

/// A held gate slot, released on drop.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl GatePermit {
    /// Release the slot now.
    pub fn release(self) {
        drop(self);
    }
}
