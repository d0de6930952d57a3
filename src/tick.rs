//! Tick scheduling
//!
//! The runner never sleeps by itself. After each tick it asks its tick source
//! for another one, and [`TickSource::wait_next`] decides how long the caller
//! blocks before that tick fires. Tests use [`ManualTicks`] and call
//! `tick()` directly, which keeps every frame deterministic.

use embassy_time::Duration;

/// Default pause between ticks for [`IntervalTicks`].
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(2);

/// Scheduler of the next runner tick.
pub trait TickSource {
    /// Request another tick as soon as the source allows.
    fn schedule_next(&mut self);

    /// Drop the pending request, if any.
    fn cancel(&mut self);

    /// Check if a tick was requested and not yet consumed.
    fn is_pending(&self) -> bool;

    /// Block until the pending tick is due and consume it.
    ///
    /// Returns `false` without blocking when nothing is pending.
    fn wait_next(&mut self) -> bool;
}

/// Run the next tick as soon as possible, yielding to other threads first.
#[derive(Debug, Default)]
pub struct ImmediateTicks {
    pending: bool,
}

impl ImmediateTicks {
    pub const fn new() -> Self {
        Self { pending: false }
    }
}

impl TickSource for ImmediateTicks {
    fn schedule_next(&mut self) {
        self.pending = true;
    }

    fn cancel(&mut self) {
        self.pending = false;
    }

    fn is_pending(&self) -> bool {
        self.pending
    }

    fn wait_next(&mut self) -> bool {
        if !self.pending {
            return false;
        }
        self.pending = false;
        std::thread::yield_now();
        true
    }
}

/// Fixed pause between ticks.
///
/// Trades frame granularity for not saturating a core.
#[derive(Debug)]
pub struct IntervalTicks {
    interval: Duration,
    pending: bool,
}

impl IntervalTicks {
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: false,
        }
    }

    pub const fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for IntervalTicks {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}

impl TickSource for IntervalTicks {
    fn schedule_next(&mut self) {
        self.pending = true;
    }

    fn cancel(&mut self) {
        self.pending = false;
    }

    fn is_pending(&self) -> bool {
        self.pending
    }

    fn wait_next(&mut self) -> bool {
        if !self.pending {
            return false;
        }
        self.pending = false;
        std::thread::sleep(core::time::Duration::from_micros(
            self.interval.as_micros(),
        ));
        true
    }
}

/// Tick source that never blocks; the caller drives ticks by hand.
#[derive(Debug, Default)]
pub struct ManualTicks {
    pending: bool,
    requested: usize,
    cancelled: usize,
}

impl ManualTicks {
    pub const fn new() -> Self {
        Self {
            pending: false,
            requested: 0,
            cancelled: 0,
        }
    }

    /// Number of `schedule_next` calls so far
    pub const fn requested(&self) -> usize {
        self.requested
    }

    /// Number of `cancel` calls that dropped a pending tick
    pub const fn cancelled(&self) -> usize {
        self.cancelled
    }
}

impl TickSource for ManualTicks {
    fn schedule_next(&mut self) {
        self.pending = true;
        self.requested += 1;
    }

    fn cancel(&mut self) {
        if self.pending {
            self.cancelled += 1;
        }
        self.pending = false;
    }

    fn is_pending(&self) -> bool {
        self.pending
    }

    fn wait_next(&mut self) -> bool {
        let was_pending = self.pending;
        self.pending = false;
        was_pending
    }
}
