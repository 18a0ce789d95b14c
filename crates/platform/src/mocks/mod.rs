//! Mock implementations for testing
//!
//! This module provides mock implementations of all platform traits
//! for use in unit and integration tests.

#![cfg(any(test, feature = "std"))]

use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use embassy_time::{Duration, Instant};

use crate::{Board, BusDriver, ConsoleSink, MonotonicClock, PeriodicActivity};

/// Manually stepped clock.
///
/// Starts at `Instant::MIN` (t = 0) and only moves when told to.
#[derive(Debug, Default)]
pub struct MockClock {
    micros: AtomicU64,
}

impl MockClock {
    /// Clock at t = 0.
    pub const fn new() -> Self {
        Self {
            micros: AtomicU64::new(0),
        }
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        self.micros.fetch_add(by.as_micros(), Ordering::SeqCst);
    }

    /// Jump to an absolute time.
    pub fn set(&self, at: Instant) {
        self.micros.store(at.as_micros(), Ordering::SeqCst);
    }
}

impl MonotonicClock for MockClock {
    fn now(&self) -> Instant {
        Instant::from_micros(self.micros.load(Ordering::SeqCst))
    }
}

/// Bus driver that counts reset and dump requests.
#[derive(Debug, Default)]
pub struct MockBus {
    resets: AtomicU32,
    dumps: AtomicU32,
}

impl MockBus {
    /// Create new mock bus
    pub const fn new() -> Self {
        Self {
            resets: AtomicU32::new(0),
            dumps: AtomicU32::new(0),
        }
    }

    /// Number of `reset_bus` calls
    pub fn resets(&self) -> u32 {
        self.resets.load(Ordering::SeqCst)
    }

    /// Number of `dump_bus_state` calls
    pub fn dumps(&self) -> u32 {
        self.dumps.load(Ordering::SeqCst)
    }
}

impl BusDriver for MockBus {
    fn reset_bus(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }

    fn dump_bus_state(&self) {
        self.dumps.fetch_add(1, Ordering::SeqCst);
    }
}

/// Periodic activity that counts ticks and can consume mock time.
pub struct MockActivity<'a> {
    ticks: u32,
    clock: Option<(&'a MockClock, Duration)>,
}

impl<'a> MockActivity<'a> {
    /// Activity that takes no time.
    pub fn new() -> Self {
        Self {
            ticks: 0,
            clock: None,
        }
    }

    /// Activity that advances `clock` by `work` on every tick.
    pub fn with_work(clock: &'a MockClock, work: Duration) -> Self {
        Self {
            ticks: 0,
            clock: Some((clock, work)),
        }
    }

    /// Number of completed ticks
    pub fn ticks(&self) -> u32 {
        self.ticks
    }
}

impl Default for MockActivity<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl PeriodicActivity for MockActivity<'_> {
    fn run_cycle(&mut self) {
        if let Some((clock, work)) = self.clock {
            clock.advance(work);
        }
        self.ticks = self.ticks.saturating_add(1);
    }
}

/// Maximum stored line length; longer lines are cut.
pub const MOCK_LINE_BYTES: usize = 96;

/// Maximum stored lines; later lines are dropped.
pub const MOCK_CONSOLE_LINES: usize = 64;

/// Console that keeps every emitted line.
#[derive(Debug, Default)]
pub struct MockConsole {
    lines: heapless::Vec<heapless::String<MOCK_LINE_BYTES>, MOCK_CONSOLE_LINES>,
}

impl MockConsole {
    /// Create new mock console
    pub fn new() -> Self {
        Self {
            lines: heapless::Vec::new(),
        }
    }

    /// Captured lines, oldest first
    pub fn lines(&self) -> impl Iterator<Item = &str> + '_ {
        self.lines.iter().map(|line| line.as_str())
    }

    /// Number of captured lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// `true` when nothing was emitted
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// `true` if any captured line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().any(|line| line.contains(needle))
    }

    /// Forget captured lines
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl ConsoleSink for MockConsole {
    fn emit_line(&mut self, line: &str) {
        let mut stored = heapless::String::new();
        for ch in line.chars() {
            if stored.push(ch).is_err() {
                break;
            }
        }
        let _ = self.lines.push(stored);
    }
}

/// Board that records the order of bring-up calls and can fail one of them.
#[derive(Debug, Default)]
pub struct MockBoard {
    calls: heapless::Vec<&'static str, 8>,
    fail_at: Option<&'static str>,
    channel_mask: Option<u8>,
}

/// Error returned by [`MockBoard`] at its configured failing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockBoardError(pub &'static str);

impl MockBoard {
    /// Board whose every step succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Board that fails at the step named `step` (e.g. `"init_safety"`).
    pub fn failing_at(step: &'static str) -> Self {
        Self {
            fail_at: Some(step),
            ..Self::default()
        }
    }

    /// Step names in the order they were called.
    pub fn calls(&self) -> &[&'static str] {
        &self.calls
    }

    /// Mask passed to `init_outputs`, if it was called.
    pub fn channel_mask(&self) -> Option<u8> {
        self.channel_mask
    }

    fn step(&mut self, name: &'static str) -> Result<(), MockBoardError> {
        let _ = self.calls.push(name);
        if self.fail_at == Some(name) {
            return Err(MockBoardError(name));
        }
        Ok(())
    }
}

impl Board for MockBoard {
    type Error = MockBoardError;

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
        self.channel_mask = Some(channel_mask);
        self.step("init_outputs")
    }

    fn spawn_controls(&mut self) -> Result<(), Self::Error> {
        self.step("spawn_controls")
    }

    fn init_bus(&mut self) -> Result<(), Self::Error> {
        self.step("init_bus")
    }
}
