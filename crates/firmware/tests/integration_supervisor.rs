//! Integration test: supervisory loop cycles against mock collaborators.
//!
//! The activity advances the [`MockClock`] by one cycle's worth of time per
//! tick and the wakeup is raised before every cycle, so the loop runs at
//! full speed while the watchdog and health reporter see realistic time.
//! The timer is dispatched after every cycle, as its interrupt would.
//!
//! Run with: cargo test -p firmware --test integration_supervisor

// Integration test file -- intentional test patterns permitted.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
)]

use diagnostics::{diag, DrainReport, Level};
use firmware::{
    BusWatchdog, DeadlineTimer, IsrDiagnostics, Scheduler, Shared, Supervisor, SupervisorConfig,
    Wake, WakeupSignal,
};
use platform::mocks::{MockActivity, MockBus, MockClock, MockConsole};
use platform::{Duration, ElapsedPerf, LiveRegisters, PeriodicActivity};

const CYCLE: Duration = Duration::from_millis(20);

struct Rig {
    clock: MockClock,
    bus: MockBus,
    diagnostics: IsrDiagnostics,
    registers: LiveRegisters,
    wakeup: WakeupSignal,
}

impl Rig {
    fn new() -> Self {
        Self {
            clock: MockClock::new(),
            bus: MockBus::new(),
            diagnostics: IsrDiagnostics::new(),
            registers: LiveRegisters::new(),
            wakeup: WakeupSignal::new(),
        }
    }

    fn shared<'a>(
        &'a self,
        watchdog: &'a BusWatchdog<'a, &'a MockBus>,
    ) -> Shared<'a, &'a MockBus> {
        Shared {
            watchdog,
            wakeup: &self.wakeup,
            diagnostics: &self.diagnostics,
            registers: &self.registers,
        }
    }
}

/// Activity whose n-th tick takes `script[n]` milliseconds, then
/// [`CYCLE`] once the script runs out.
struct ScriptedActivity<'a> {
    clock: &'a MockClock,
    script: Vec<u64>,
    ticks: usize,
}

impl PeriodicActivity for ScriptedActivity<'_> {
    fn run_cycle(&mut self) {
        let ms = self.script.get(self.ticks).copied();
        self.clock
            .advance(ms.map_or(CYCLE, Duration::from_millis));
        self.ticks += 1;
    }
}

/// Raise, cycle and dispatch `$n` times; evaluates to the last report.
macro_rules! run_cycles {
    ($rig:expr, $timer:expr, $supervisor:expr, $n:expr) => {{
        let mut last = None;
        for _ in 0..$n {
            $rig.wakeup.raise();
            last = Some($supervisor.cycle().await);
            $timer.dispatch();
        }
        last.unwrap()
    }};
}

#[tokio::test]
async fn healthy_cycles_never_trip_the_watchdog() {
    let rig = Rig::new();
    let timer: DeadlineTimer<'_, _, 2> = DeadlineTimer::new(&rig.clock);
    let handle = timer.allocate().unwrap();
    let config = SupervisorConfig::default();
    let watchdog = BusWatchdog::new(
        &timer,
        handle,
        &rig.bus,
        &rig.diagnostics,
        config.watchdog_timeout,
    );
    let mut supervisor = Supervisor::new(
        config,
        &rig.clock,
        rig.shared(&watchdog),
        MockActivity::with_work(&rig.clock, CYCLE),
        ElapsedPerf::new("mix"),
        MockConsole::new(),
    );

    let report = run_cycles!(rig, timer, supervisor, 200);

    assert_eq!(report.wake, Wake::Raised);
    assert_eq!(report.elapsed, CYCLE);
    assert_eq!(watchdog.recoveries(), 0);
    assert_eq!(rig.bus.resets(), 0);
    assert_eq!(supervisor.cycles(), 200);
    assert_eq!(supervisor.activity().ticks(), 200);
    assert_eq!(supervisor.perf().events(), 200);
    assert_eq!(supervisor.perf().max(), CYCLE);
    assert!(timer.is_armed(handle));
}

#[tokio::test]
async fn stalled_activity_is_recovered_and_reported() {
    let rig = Rig::new();
    let timer: DeadlineTimer<'_, _, 2> = DeadlineTimer::new(&rig.clock);
    let handle = timer.allocate().unwrap();
    let config = SupervisorConfig::default();
    let watchdog = BusWatchdog::new(
        &timer,
        handle,
        &rig.bus,
        &rig.diagnostics,
        config.watchdog_timeout,
    );
    let activity = ScriptedActivity {
        clock: &rig.clock,
        script: vec![20, 20, 70],
        ticks: 0,
    };
    let mut supervisor = Supervisor::new(
        config,
        &rig.clock,
        rig.shared(&watchdog),
        activity,
        ElapsedPerf::new("mix"),
        MockConsole::new(),
    );

    run_cycles!(rig, timer, supervisor, 3);
    assert_eq!(watchdog.recoveries(), 1);
    assert_eq!(rig.bus.dumps(), 1);
    assert_eq!(rig.bus.resets(), 1);
    assert_eq!(supervisor.perf().max(), Duration::from_millis(70));

    // The recovery record is drained on the following cycle.
    let report = run_cycles!(rig, timer, supervisor, 1);
    assert_eq!(report.drained.delivered, 1);
    assert!(supervisor.console().contains("RESETTING r=1"));

    run_cycles!(rig, timer, supervisor, 20);
    assert_eq!(watchdog.recoveries(), 1);
}

#[tokio::test]
async fn health_report_is_queued_once_per_interval() {
    let rig = Rig::new();
    rig.registers.set_debug_level(1);
    rig.registers.set_status_flags(0x41);
    let timer: DeadlineTimer<'_, _, 2> = DeadlineTimer::new(&rig.clock);
    let handle = timer.allocate().unwrap();
    let config = SupervisorConfig::default();
    let watchdog = BusWatchdog::new(
        &timer,
        handle,
        &rig.bus,
        &rig.diagnostics,
        config.watchdog_timeout,
    );
    let mut supervisor = Supervisor::new(
        config,
        &rig.clock,
        rig.shared(&watchdog),
        MockActivity::with_work(&rig.clock, CYCLE),
        ElapsedPerf::new("mix"),
        MockConsole::new(),
    );

    // 50 cycles put the clock at exactly 1 s: not yet strictly past.
    let report = run_cycles!(rig, timer, supervisor, 50);
    assert_eq!(report.health, None);

    let report = run_cycles!(rig, timer, supervisor, 1);
    let health = report.health.unwrap();
    assert_eq!(health.recoveries, 0);
    assert_eq!(health.registers.status_flags, 0x41);

    run_cycles!(rig, timer, supervisor, 1);
    assert!(supervisor.console().contains("d:1 s=0x41 a=0x0 f=0x0 r=0"));

    // Next report is due 1 s after the previous one, at cycle 102.
    for _ in 53..102 {
        assert_eq!(run_cycles!(rig, timer, supervisor, 1).health, None);
    }
    assert!(run_cycles!(rig, timer, supervisor, 1).health.is_some());
}

#[tokio::test]
async fn verbosity_follows_the_live_debug_level() {
    let rig = Rig::new();
    let timer: DeadlineTimer<'_, _, 2> = DeadlineTimer::new(&rig.clock);
    let handle = timer.allocate().unwrap();
    let config = SupervisorConfig::default();
    let watchdog = BusWatchdog::new(
        &timer,
        handle,
        &rig.bus,
        &rig.diagnostics,
        config.watchdog_timeout,
    );
    let mut supervisor = Supervisor::new(
        config,
        &rig.clock,
        rig.shared(&watchdog),
        MockActivity::with_work(&rig.clock, CYCLE),
        ElapsedPerf::new("mix"),
        MockConsole::new(),
    );

    // Level 0: the health report is produced but filtered out.
    let report = run_cycles!(rig, timer, supervisor, 51);
    assert!(report.health.is_some());
    assert_eq!(rig.diagnostics.verbosity(), 0);
    run_cycles!(rig, timer, supervisor, 1);
    assert!(supervisor.console().is_empty());

    rig.registers.set_debug_level(2);
    run_cycles!(rig, timer, supervisor, 1);
    assert_eq!(rig.diagnostics.verbosity(), 2);

    // Second report at cycle 102 gets through.
    run_cycles!(rig, timer, supervisor, 50);
    assert!(supervisor.console().contains("d:2"));
}

#[tokio::test]
async fn drain_delivers_newest_records_and_counts_loss() {
    let rig = Rig::new();
    rig.registers.set_debug_level(1);
    let timer: DeadlineTimer<'_, _, 2> = DeadlineTimer::new(&rig.clock);
    let handle = timer.allocate().unwrap();
    let config = SupervisorConfig::default();
    let watchdog = BusWatchdog::new(
        &timer,
        handle,
        &rig.bus,
        &rig.diagnostics,
        config.watchdog_timeout,
    );
    let mut supervisor = Supervisor::new(
        config,
        &rig.clock,
        rig.shared(&watchdog),
        MockActivity::with_work(&rig.clock, CYCLE),
        ElapsedPerf::new("mix"),
        MockConsole::new(),
    );

    diag!(rig.diagnostics, Level::ALWAYS, "A");
    diag!(rig.diagnostics, Level::ALWAYS, "B");
    diag!(rig.diagnostics, Level::ALWAYS, "C");

    let report = run_cycles!(rig, timer, supervisor, 1);

    assert_eq!(
        report.drained,
        DrainReport {
            delivered: 2,
            lost: 1
        }
    );
    let lines: Vec<&str> = supervisor.console().lines().collect();
    assert_eq!(lines, vec!["B", "C"]);

    let report = run_cycles!(rig, timer, supervisor, 1);
    assert!(report.drained.is_empty());
}

#[tokio::test]
async fn unraised_cycle_sleeps_the_full_period() {
    let rig = Rig::new();
    let timer: DeadlineTimer<'_, _, 2> = DeadlineTimer::new(&rig.clock);
    let handle = timer.allocate().unwrap();
    let config = SupervisorConfig::default().with_cycle_period(Duration::from_millis(5));
    let watchdog = BusWatchdog::new(
        &timer,
        handle,
        &rig.bus,
        &rig.diagnostics,
        config.watchdog_timeout,
    );
    let mut supervisor = Supervisor::new(
        config,
        &rig.clock,
        rig.shared(&watchdog),
        MockActivity::new(),
        ElapsedPerf::new("mix"),
        MockConsole::new(),
    );

    let started = std::time::Instant::now();
    let report = supervisor.cycle().await;

    assert_eq!(report.wake, Wake::Elapsed);
    assert!(started.elapsed() >= std::time::Duration::from_millis(5));
    assert_eq!(supervisor.activity().ticks(), 1);
}
