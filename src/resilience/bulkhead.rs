//! Concurrency limit for calls to a single downstream service.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Caps the number of in-flight calls.
#[derive(Debug)]
pub struct Bulkhead {
    max_concurrent: usize,
    in_flight: AtomicUsize,
}

impl Bulkhead {
    pub fn new(max_concurrent: usize) -> Arc<Self> {
        Arc::new(Self {
            max_concurrent,
            in_flight: AtomicUsize::new(0),
        })
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Take a permit, or `None` if the limit is reached.
    /// The permit is released when dropped.
    pub fn try_acquire(self: &Arc<Self>) -> Option<BulkheadPermit> {
        let mut prev = self.in_flight.load(Ordering::Relaxed);
        loop {
            if prev >= self.max_concurrent {
                return None;
            }
            match self.in_flight.compare_exchange_weak(
                prev,
                prev + 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(x) => prev = x,
            }
        }
        Some(BulkheadPermit {
            bulkhead: self.clone(),
        })
    }
}

#[derive(Debug)]
pub struct BulkheadPermit {
    bulkhead: Arc<Bulkhead>,
}

impl Drop for BulkheadPermit {
    fn drop(&mut self) {
        self.bulkhead.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}
