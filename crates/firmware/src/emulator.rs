//! Host stand-ins for the board collaborators (emulator feature).
//!
//! Everything here logs through `tracing` instead of touching hardware. The
//! mixer can be told to stall so the watchdog recovery path can be watched
//! end to end on a desktop.

use core::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration as StdDuration;

use platform::{Board, BusDriver, ConsoleSink, Instant, PeriodicActivity};
use thiserror_no_std::Error;

use crate::timer::{Callout, Rearm};

/// Install a `tracing` subscriber honouring `RUST_LOG` (default `info`).
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Console lines as `tracing` events on the `console` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingConsole;

impl ConsoleSink for TracingConsole {
    fn emit_line(&mut self, line: &str) {
        tracing::info!(target: "console", "{line}");
    }
}

/// Bus that only logs and counts.
#[derive(Debug, Default)]
pub struct SimulatedBus {
    resets: AtomicU32,
}

impl SimulatedBus {
    /// No resets yet.
    pub const fn new() -> Self {
        Self {
            resets: AtomicU32::new(0),
        }
    }

    /// Resets requested so far.
    pub fn resets(&self) -> u32 {
        self.resets.load(Ordering::Relaxed)
    }
}

impl BusDriver for SimulatedBus {
    fn reset_bus(&self) {
        let n = self.resets.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        tracing::warn!(resets = n, "bus reset");
    }

    fn dump_bus_state(&self) {
        tracing::warn!(resets = self.resets(), "bus state dump");
    }
}

/// Poll callout that counts fires.
#[derive(Debug, Default)]
pub struct SimulatedPoll {
    polls: AtomicU32,
}

impl SimulatedPoll {
    /// No polls yet.
    pub const fn new() -> Self {
        Self {
            polls: AtomicU32::new(0),
        }
    }

    /// Polls so far.
    pub fn polls(&self) -> u32 {
        self.polls.load(Ordering::Relaxed)
    }
}

impl Callout for SimulatedPoll {
    fn fire(&self, _now: Instant) -> Rearm {
        self.polls.fetch_add(1, Ordering::Relaxed);
        Rearm::Keep
    }
}

/// Error from [`SimulatedBoard`] at its configured failing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("simulated failure in {0}")]
pub struct SimulatedBoardError(pub &'static str);

/// Board that logs each bring-up step and can be told to fail one.
#[derive(Debug, Default)]
pub struct SimulatedBoard {
    fail_at: Option<&'static str>,
}

impl SimulatedBoard {
    /// Board whose every step succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Board that fails at the step named `step` (e.g. `"init_bus"`).
    pub fn failing_at(step: &'static str) -> Self {
        Self {
            fail_at: Some(step),
        }
    }

    fn step(&self, name: &'static str) -> Result<(), SimulatedBoardError> {
        if self.fail_at == Some(name) {
            return Err(SimulatedBoardError(name));
        }
        tracing::info!(step = name, "board");
        Ok(())
    }
}

impl Board for SimulatedBoard {
    type Error = SimulatedBoardError;

    fn init_timer(&mut self) -> Result<(), Self::Error> {
        self.step("init_timer")
    }

    fn enable_output_power(&mut self) -> Result<(), Self::Error> {
        self.step("enable_output_power")
    }

    fn init_safety(&mut self) -> Result<(), Self::Error> {
        self.step("init_safety")
    }

    fn init_outputs(&mut self, channel_mask: u8) -> Result<(), Self::Error> {
        tracing::debug!(channel_mask, "outputs");
        self.step("init_outputs")
    }

    fn spawn_controls(&mut self) -> Result<(), Self::Error> {
        self.step("spawn_controls")
    }

    fn init_bus(&mut self) -> Result<(), Self::Error> {
        self.step("init_bus")
    }
}

/// Mixer that blocks the calling thread for `stall` on every
/// `stall_every`-th tick, the way a wedged bus driver would.
#[derive(Debug)]
pub struct StallingMixer {
    ticks: u32,
    stall_every: u32,
    stall: StdDuration,
}

impl StallingMixer {
    /// Stall for `stall` on every `stall_every`-th tick; `0` never stalls.
    pub fn new(stall_every: u32, stall: StdDuration) -> Self {
        Self {
            ticks: 0,
            stall_every,
            stall,
        }
    }

    /// Ticks so far.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }
}

impl PeriodicActivity for StallingMixer {
    fn run_cycle(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
        if self.ticks.checked_rem(self.stall_every) == Some(0) {
            tracing::warn!(tick = self.ticks, stall = ?self.stall, "mixer stalled");
            std::thread::sleep(self.stall);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_board_fails_only_at_named_step() {
        let mut board = SimulatedBoard::failing_at("init_safety");
        assert!(board.init_timer().is_ok());
        assert_eq!(board.init_safety(), Err(SimulatedBoardError("init_safety")));
        assert!(board.init_bus().is_ok());
    }

    #[test]
    fn mixer_without_stall_period_never_blocks() {
        let mut mixer = StallingMixer::new(0, StdDuration::from_secs(60));
        for _ in 0..10 {
            mixer.run_cycle();
        }
        assert_eq!(mixer.ticks(), 10);
    }
}
