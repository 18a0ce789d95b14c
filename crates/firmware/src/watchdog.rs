//! Peripheral bus watchdog
//!
//! The supervisory loop arms the watchdog at the top of every cycle. Each arm
//! replaces the pending deadline, so a loop that keeps its cadence never lets
//! the deadline fire. A stalled cycle lets it fire, and the recovery callout
//! then dumps and resets the bus, counts the event, and re-arms itself for the
//! same timeout so a reset that does not clear the stall trips again.
//!
//! ```text
//!            arm()                 timeout elapses
//! Disarmed ─────────▶ Armed ─────────────────────────▶ Tripped
//!                     ▲   │ arm() (replaces deadline)     │
//!                     │   └───────────┘                   │
//!                     └───── dump, reset, re-arm ◀────────┘
//! ```

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use diagnostics::{diag, Level};
use platform::{BusDriver, Duration, Instant};

use crate::timer::{Callout, Rearm, Scheduler, TimerHandle};
use crate::IsrDiagnostics;

/// Watchdog state as seen from outside the recovery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WatchdogState {
    /// Never armed, or disarmed.
    Disarmed,
    /// A recovery deadline is pending.
    Armed,
    /// The recovery callout is running.
    Tripped,
}

impl WatchdogState {
    const fn to_raw(self) -> u8 {
        match self {
            Self::Disarmed => 0,
            Self::Armed => 1,
            Self::Tripped => 2,
        }
    }

    const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Armed,
            2 => Self::Tripped,
            _ => Self::Disarmed,
        }
    }
}

/// Deadline-based stall detector for one peripheral bus.
///
/// The recovery counter only ever increases; it wraps after `u32::MAX`
/// recoveries.
pub struct BusWatchdog<'a, B: BusDriver> {
    scheduler: &'a dyn Scheduler<'a>,
    handle: TimerHandle,
    bus: B,
    diagnostics: &'a IsrDiagnostics,
    timeout: Duration,
    recoveries: AtomicU32,
    state: AtomicU8,
}

impl<'a, B: BusDriver + 'a> BusWatchdog<'a, B> {
    /// Watchdog for `bus` using `handle` on `scheduler`.
    ///
    /// `handle` must be dedicated to this watchdog.
    pub fn new(
        scheduler: &'a dyn Scheduler<'a>,
        handle: TimerHandle,
        bus: B,
        diagnostics: &'a IsrDiagnostics,
        timeout: Duration,
    ) -> Self {
        Self {
            scheduler,
            handle,
            bus,
            diagnostics,
            timeout,
            recoveries: AtomicU32::new(0),
            state: AtomicU8::new(WatchdogState::Disarmed.to_raw()),
        }
    }

    /// (Re)schedule the recovery deadline at `now + timeout`.
    ///
    /// Replaces any pending deadline. Called once per cycle before any
    /// bus-dependent work.
    pub fn arm(&'a self) {
        self.set_state(WatchdogState::Armed);
        self.scheduler.arm_after(self.handle, self.timeout, self);
    }

    /// Cancel the pending deadline.
    pub fn disarm(&self) {
        self.scheduler.cancel(self.handle);
        self.set_state(WatchdogState::Disarmed);
    }

    /// Recovery events so far.
    pub fn recoveries(&self) -> u32 {
        self.recoveries.load(Ordering::Relaxed)
    }

    /// Current state.
    pub fn state(&self) -> WatchdogState {
        WatchdogState::from_raw(self.state.load(Ordering::Acquire))
    }

    /// Configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The monitored bus.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    fn set_state(&self, state: WatchdogState) {
        self.state.store(state.to_raw(), Ordering::Release);
    }
}

impl<'a, B: BusDriver + 'a> Callout for BusWatchdog<'a, B> {
    fn fire(&self, _now: Instant) -> Rearm {
        self.set_state(WatchdogState::Tripped);
        let count = self.recoveries.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        diag!(self.diagnostics, Level::ALWAYS, "RESETTING r={}", count);

        self.bus.dump_bus_state();
        self.bus.reset_bus();

        self.set_state(WatchdogState::Armed);
        Rearm::After(self.timeout)
    }
}

impl<'a, B: BusDriver + 'a> core::fmt::Debug for BusWatchdog<'a, B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BusWatchdog")
            .field("handle", &self.handle)
            .field("timeout", &self.timeout)
            .field("recoveries", &self.recoveries())
            .field("state", &WatchdogState::from_raw(self.state.load(Ordering::Acquire)))
            .finish_non_exhaustive()
    }
}
