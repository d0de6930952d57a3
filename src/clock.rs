//! Time sources for the runner.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use embassy_time::{Duration, Instant};

/// Source of the current absolute time.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock backed by the embassy-time driver
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-driven clock.
///
/// Clones share the same time, so a test can keep one clone and move the
/// other into a runner.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    micros: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Instant) -> Self {
        Self {
            micros: Arc::new(AtomicU64::new(start.as_micros())),
        }
    }

    /// Clock starting at the given millisecond timestamp
    pub fn from_millis(millis: u64) -> Self {
        Self::new(Instant::from_millis(millis))
    }

    pub fn set(&self, now: Instant) {
        self.micros.store(now.as_micros(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.micros.fetch_add(by.as_micros(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        Instant::from_micros(self.micros.load(Ordering::SeqCst))
    }
}
