//! Interruptible cycle sleep
//!
//! `raise()` sets a sticky pending flag. The next `sleep_until` consumes it
//! and returns at once; without a pending raise it sleeps the full duration.
//! Raises that arrive between two sleeps are therefore never lost, and any
//! number of raises before one sleep collapse into a single early return.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};

/// Why [`WakeupSignal::sleep_until`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Wake {
    /// A raise was pending or arrived during the sleep.
    Raised,
    /// The full duration elapsed.
    Elapsed,
}

/// Edge-triggered "stop sleeping now" event with a persistent pending flag.
///
/// Any number of contexts may raise it; exactly one task sleeps on it.
pub struct WakeupSignal {
    signal: Signal<CriticalSectionRawMutex, ()>,
}

impl WakeupSignal {
    /// No raise pending.
    pub const fn new() -> Self {
        Self {
            signal: Signal::new(),
        }
    }

    /// Request that the current or next sleep end early.
    ///
    /// Safe from interrupt handlers and other tasks; never blocks.
    pub fn raise(&self) {
        self.signal.signal(());
    }

    /// `true` if a raise is waiting to be consumed.
    pub fn is_pending(&self) -> bool {
        self.signal.signaled()
    }

    /// Sleep for up to `duration`, returning early on a raise.
    ///
    /// A pending raise is consumed. When the timer and a raise are ready at
    /// the same poll the raise wins, so it cannot leak into the next sleep.
    pub async fn sleep_until(&self, duration: Duration) -> Wake {
        match select(self.signal.wait(), Timer::after(duration)).await {
            Either::First(()) => Wake::Raised,
            Either::Second(()) => Wake::Elapsed,
        }
    }
}

impl Default for WakeupSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for WakeupSignal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WakeupSignal")
            .field("pending", &self.is_pending())
            .finish()
    }
}
