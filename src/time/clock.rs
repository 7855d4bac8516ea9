//! Time sources for the scheduler's clock domain.
//!
//! The run loop reads the current time from a [`TimeSource`] and, when no task
//! is ready, asks it to wait until the earliest armed timer. A [`WallClock`]
//! actually blocks the thread; a [`VirtualClock`] jumps straight to the
//! deadline, which keeps timeout tests instant and deterministic.

use crate::types::Time;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// A source of current time for the runtime.
pub trait TimeSource: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> Time;

    /// Blocks (or jumps) until `deadline` has been reached.
    ///
    /// Called only when the run loop has nothing ready to poll.
    fn wait_until(&self, deadline: Time);
}

/// Wall clock time source for production use.
///
/// Uses `std::time::Instant` internally, converting to our `Time` type.
/// The epoch is the time when this source was created.
#[derive(Debug)]
pub struct WallClock {
    /// The instant when this clock was created.
    epoch: Instant,
}

impl WallClock {
    /// Creates a new wall clock time source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for WallClock {
    fn now(&self) -> Time {
        let elapsed = self.epoch.elapsed();
        Time::from_nanos(u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX))
    }

    fn wait_until(&self, deadline: Time) {
        let remaining = deadline.remaining_from(self.now());
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
    }
}

/// Virtual time source for deterministic testing.
///
/// Time only advances when explicitly told to do so, either by the run loop
/// jumping to the next timer or by test code calling [`advance`](Self::advance).
///
/// # Example
///
/// ```
/// use coop_timeout::time::{TimeSource, VirtualClock};
/// use coop_timeout::types::Time;
///
/// let clock = VirtualClock::new();
/// assert_eq!(clock.now(), Time::ZERO);
///
/// clock.wait_until(Time::from_secs(3));
/// assert_eq!(clock.now(), Time::from_secs(3));
/// ```
#[derive(Debug)]
pub struct VirtualClock {
    /// Current time in nanoseconds.
    now: AtomicU64,
}

impl VirtualClock {
    /// Creates a new virtual clock starting at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: AtomicU64::new(0),
        }
    }

    /// Creates a virtual clock starting at the given time.
    #[must_use]
    pub fn starting_at(time: Time) -> Self {
        Self {
            now: AtomicU64::new(time.as_nanos()),
        }
    }

    /// Advances time by the given number of nanoseconds.
    pub fn advance(&self, nanos: u64) {
        self.now.fetch_add(nanos, Ordering::Release);
    }

    /// Advances time to the given absolute time.
    ///
    /// If the target time is in the past, this is a no-op.
    pub fn advance_to(&self, time: Time) {
        self.now.fetch_max(time.as_nanos(), Ordering::AcqRel);
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for VirtualClock {
    fn now(&self) -> Time {
        Time::from_nanos(self.now.load(Ordering::Acquire))
    }

    fn wait_until(&self, deadline: Time) {
        self.advance_to(deadline);
    }
}
