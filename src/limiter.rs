// src/limiter.rs

//! Concurrency limiter: the admission gate in front of the process runner.
//!
//! Thin wrapper over `tokio::sync::Semaphore`, which queues waiters in FIFO
//! order, so jobs are admitted first-requested, first-admitted. The wrapper
//! adds two things the raw semaphore doesn't give us:
//!
//! - cancellation-aware `acquire` (a pending acquire unblocks with
//!   [`Cancelled`](AcquireError::Cancelled) instead of hanging), and
//! - an instrumented in-flight count plus high-water mark, so tests can
//!   verify the bound is never exceeded, not even transiently.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::cancel::CancelSignal;

/// Why an acquire did not produce a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireError {
    /// The run was cancelled while waiting for a slot.
    Cancelled,
}

#[derive(Debug)]
struct LimiterState {
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
}

/// Bounds how many jobs run at once.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    state: Arc<LimiterState>,
    max: usize,
}

impl ConcurrencyLimiter {
    /// `max` must be at least 1; the orchestrator validates that before
    /// constructing a limiter.
    pub fn new(max: usize) -> Self {
        debug_assert!(max >= 1);
        Self {
            semaphore: Arc::new(Semaphore::new(max)),
            state: Arc::new(LimiterState {
                in_flight: AtomicUsize::new(0),
                high_water: AtomicUsize::new(0),
            }),
            max,
        }
    }

    /// Wait for a free slot or cancellation, whichever comes first.
    pub async fn acquire(&self, cancel: &mut CancelSignal) -> Result<SlotPermit, AcquireError> {
        if cancel.is_cancelled() {
            return Err(AcquireError::Cancelled);
        }

        let permit = tokio::select! {
            // Biased so that cancellation wins a race against an available
            // slot: a cancelled run must not admit new jobs.
            biased;
            _ = cancel.cancelled() => return Err(AcquireError::Cancelled),
            permit = Arc::clone(&self.semaphore).acquire_owned() => {
                // The semaphore is never closed while the limiter exists.
                match permit {
                    Ok(p) => p,
                    Err(_) => return Err(AcquireError::Cancelled),
                }
            }
        };

        let now = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.high_water.fetch_max(now, Ordering::SeqCst);

        Ok(SlotPermit {
            _permit: permit,
            state: Arc::clone(&self.state),
        })
    }

    /// Jobs currently holding a slot.
    pub fn in_flight(&self) -> usize {
        self.state.in_flight.load(Ordering::SeqCst)
    }

    /// Highest in-flight count observed so far.
    pub fn high_water(&self) -> usize {
        self.state.high_water.load(Ordering::SeqCst)
    }

    pub fn max_concurrency(&self) -> usize {
        self.max
    }
}

/// A held concurrency slot. Dropping it releases the slot and wakes the
/// longest-waiting acquirer.
#[derive(Debug)]
pub struct SlotPermit {
    _permit: OwnedSemaphorePermit,
    state: Arc<LimiterState>,
}

impl Drop for SlotPermit {
    fn drop(&mut self) {
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
