//! Integration test: bus watchdog driven through the deadline timer.
//!
//! Time is a [`MockClock`] stepped one millisecond at a time with a dispatch
//! after every step, standing in for the timer interrupt.
//!
//! Run with: cargo test -p firmware --test integration_watchdog

// Integration test file -- intentional test patterns permitted.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
)]

use core::sync::atomic::{AtomicU32, Ordering};

use firmware::{
    BusWatchdog, Callout, DeadlineTimer, IsrDiagnostics, Rearm, Scheduler, WatchdogState,
};
use platform::mocks::{MockBus, MockClock};
use platform::{Duration, Instant, MonotonicClock};

const TIMEOUT: Duration = Duration::from_millis(30);

fn step<C: MonotonicClock, const N: usize>(
    timer: &DeadlineTimer<'_, C, N>,
    clock: &MockClock,
    ms: u64,
) {
    for _ in 0..ms {
        clock.advance(Duration::from_millis(1));
        timer.dispatch();
    }
}

fn drained_lines(diagnostics: &IsrDiagnostics) -> Vec<String> {
    let mut lines = Vec::new();
    diagnostics.drain(|record| lines.push(record.text().to_owned()));
    lines
}

#[test]
fn rearming_below_timeout_never_recovers() {
    let clock = MockClock::new();
    let bus = MockBus::new();
    let diagnostics = IsrDiagnostics::new();
    let timer: DeadlineTimer<'_, _, 2> = DeadlineTimer::new(&clock);
    let handle = timer.allocate().unwrap();
    let watchdog = BusWatchdog::new(&timer, handle, &bus, &diagnostics, TIMEOUT);

    for _ in 0..1000 {
        watchdog.arm();
        step(&timer, &clock, 20);
    }

    assert_eq!(watchdog.recoveries(), 0);
    assert_eq!(bus.resets(), 0);
    assert_eq!(bus.dumps(), 0);
    assert_eq!(watchdog.state(), WatchdogState::Armed);
    assert_eq!(diagnostics.pending(), 0);
}

#[test]
fn withheld_rearm_recovers_once_per_timeout() {
    let clock = MockClock::new();
    let bus = MockBus::new();
    let diagnostics = IsrDiagnostics::new();
    let timer: DeadlineTimer<'_, _, 2> = DeadlineTimer::new(&clock);
    let handle = timer.allocate().unwrap();
    let watchdog = BusWatchdog::new(&timer, handle, &bus, &diagnostics, TIMEOUT);

    // Healthy cycles at t = 0, 20, 40, 60, 80.
    for _ in 0..5 {
        watchdog.arm();
        step(&timer, &clock, 20);
    }
    assert_eq!(watchdog.recoveries(), 0);

    // Last arm was at t = 80; stall until t = 145. Fires at 110 and 140.
    step(&timer, &clock, 45);

    assert_eq!(clock.now(), Instant::from_millis(145));
    assert_eq!(watchdog.recoveries(), 2);
    assert_eq!(bus.resets(), 2);
    assert_eq!(bus.dumps(), 2);
    assert_eq!(timer.next_deadline(), Some(Instant::from_millis(170)));
    assert_eq!(
        drained_lines(&diagnostics),
        vec!["RESETTING r=1".to_owned(), "RESETTING r=2".to_owned()]
    );
}

#[test]
fn loop_resuming_after_recovery_stops_further_resets() {
    let clock = MockClock::new();
    let bus = MockBus::new();
    let diagnostics = IsrDiagnostics::new();
    let timer: DeadlineTimer<'_, _, 2> = DeadlineTimer::new(&clock);
    let handle = timer.allocate().unwrap();
    let watchdog = BusWatchdog::new(&timer, handle, &bus, &diagnostics, TIMEOUT);

    watchdog.arm();
    step(&timer, &clock, 35);
    assert_eq!(watchdog.recoveries(), 1);

    for _ in 0..50 {
        watchdog.arm();
        step(&timer, &clock, 20);
    }
    assert_eq!(watchdog.recoveries(), 1);
    assert_eq!(bus.resets(), 1);
}

#[test]
fn recovery_record_bypasses_zero_verbosity() {
    let clock = MockClock::new();
    let bus = MockBus::new();
    let diagnostics = IsrDiagnostics::new();
    diagnostics.set_verbosity(0);
    let timer: DeadlineTimer<'_, _, 2> = DeadlineTimer::new(&clock);
    let handle = timer.allocate().unwrap();
    let watchdog = BusWatchdog::new(&timer, handle, &bus, &diagnostics, TIMEOUT);

    watchdog.arm();
    step(&timer, &clock, 30);

    assert_eq!(drained_lines(&diagnostics), vec!["RESETTING r=1".to_owned()]);
}

#[derive(Default)]
struct CountingPoll {
    polls: AtomicU32,
}

impl Callout for CountingPoll {
    fn fire(&self, _now: Instant) -> Rearm {
        self.polls.fetch_add(1, Ordering::SeqCst);
        Rearm::Keep
    }
}

#[test]
fn bus_poll_keeps_running_alongside_recovery() {
    let poll = CountingPoll::default();
    let clock = MockClock::new();
    let bus = MockBus::new();
    let diagnostics = IsrDiagnostics::new();
    let timer: DeadlineTimer<'_, _, 2> = DeadlineTimer::new(&clock);
    let poll_handle = timer.allocate().unwrap();
    let watchdog_handle = timer.allocate().unwrap();
    let watchdog = BusWatchdog::new(&timer, watchdog_handle, &bus, &diagnostics, TIMEOUT);

    timer.arm_every(
        poll_handle,
        Duration::from_millis(1),
        Duration::from_millis(1),
        &poll,
    );
    watchdog.arm();
    step(&timer, &clock, 100);

    assert_eq!(poll.polls.load(Ordering::SeqCst), 100);
    assert_eq!(watchdog.recoveries(), 3);
    assert!(timer.is_armed(poll_handle));
    assert!(timer.is_armed(watchdog_handle));
}
