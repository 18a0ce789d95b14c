//! Monotonic time source
//!
//! Microsecond-resolution, monotonic, immune to time-of-day changes. The
//! supervisor never reads wall-clock time.

use embassy_time::Instant;

/// Monotonic microsecond clock.
///
/// Implementations must be readable from interrupt context: the deadline
/// timer samples the clock both in thread mode (when arming) and from its
/// dispatch context (when firing and re-arming).
pub trait MonotonicClock: Sync {
    /// Current monotonic time.
    fn now(&self) -> Instant;
}

/// Clock backed by the embassy time driver (hardware timer or `std` driver).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl MonotonicClock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: MonotonicClock + ?Sized> MonotonicClock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}
