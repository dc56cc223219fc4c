//! Shared progress accounting for long denoising runs.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Monotone counter of processed pixels, shared across worker threads.
///
/// Increments use relaxed ordering, so readers get an approximate view
/// that becomes exact once the run has finished. Consumers decide how to
/// surface it; the library itself never prints progress.
#[derive(Debug)]
pub struct ProgressCounter {
    processed: AtomicUsize,
    total: usize,
}

impl ProgressCounter {
    pub fn new(total: usize) -> Self {
        Self {
            processed: AtomicUsize::new(0),
            total,
        }
    }

    /// Record one more processed pixel.
    #[inline]
    pub fn increment(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of pixels expected in total.
    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Approximate view of the current state.
    pub fn snapshot(&self) -> ProgressSnapshot {
        let processed = self.processed.load(Ordering::Relaxed);
        let fraction = if self.total == 0 {
            1.0
        } else {
            processed as f64 / self.total as f64
        };
        ProgressSnapshot {
            processed,
            total: self.total,
            fraction,
        }
    }
}

/// Point-in-time view of a [`ProgressCounter`].
#[derive(Clone, Copy, Debug)]
pub struct ProgressSnapshot {
    pub processed: usize,
    pub total: usize,
    /// Completed fraction in `[0, 1]`; one for an empty total.
    pub fraction: f64,
}
