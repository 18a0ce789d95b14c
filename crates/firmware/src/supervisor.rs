//! Supervisory loop
//!
//! Once bring-up has succeeded the loop runs forever at the configured
//! cadence. One cycle:
//!
//! 1. Pick up the live debug level as the diagnostic verbosity.
//! 2. Arm the bus watchdog for the cycle timeout.
//! 3. Sleep for the cycle period; a wakeup raise cuts the sleep short.
//! 4. Run the periodic activity and record its elapsed time.
//! 5. Drain the diagnostic channel to the console.
//! 6. If the report interval has passed, queue a health report record.
//!
//! The sleep is the only suspension point. The activity's outcome is never
//! inspected, so a failing activity cannot starve the drain or the watchdog.

use diagnostics::{diag, DrainReport, Level};
use platform::{
    BusDriver, ConsoleSink, Duration, Instant, LiveRegisters, MonotonicClock, PerfCounter,
    PeriodicActivity,
};

use crate::config::SupervisorConfig;
use crate::health::HealthReport;
use crate::wakeup::{Wake, WakeupSignal};
use crate::watchdog::BusWatchdog;
use crate::IsrDiagnostics;

/// State the loop shares with interrupt context and the host link.
pub struct Shared<'a, B: BusDriver> {
    /// Stall detector re-armed every cycle.
    pub watchdog: &'a BusWatchdog<'a, B>,
    /// Early-wake request.
    pub wakeup: &'a WakeupSignal,
    /// Interrupt-safe record ring drained every cycle.
    pub diagnostics: &'a IsrDiagnostics,
    /// Live configuration read every cycle.
    pub registers: &'a LiveRegisters,
}

impl<B: BusDriver> Clone for Shared<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: BusDriver> Copy for Shared<'_, B> {}

/// What one [`Supervisor::cycle`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleReport {
    /// How the cycle sleep ended.
    pub wake: Wake,
    /// Time spent in the periodic activity.
    pub elapsed: Duration,
    /// Outcome of the diagnostic drain.
    pub drained: DrainReport,
    /// Health report queued this cycle, if one was due.
    pub health: Option<HealthReport>,
}

/// The Running state: owns the activity, its perf counter and the console.
pub struct Supervisor<'a, C, B, A, P, S>
where
    C: MonotonicClock,
    B: BusDriver,
    A: PeriodicActivity,
    P: PerfCounter,
    S: ConsoleSink,
{
    config: SupervisorConfig,
    clock: C,
    shared: Shared<'a, B>,
    activity: A,
    perf: P,
    console: S,
    last_report: Instant,
    cycles: u32,
}

impl<'a, C, B, A, P, S> Supervisor<'a, C, B, A, P, S>
where
    C: MonotonicClock,
    B: BusDriver + 'a,
    A: PeriodicActivity,
    P: PerfCounter,
    S: ConsoleSink,
{
    /// Loop in its initial state; the first health report is due once the
    /// clock passes `report_interval`.
    pub fn new(
        config: SupervisorConfig,
        clock: C,
        shared: Shared<'a, B>,
        activity: A,
        perf: P,
        console: S,
    ) -> Self {
        Self {
            config,
            clock,
            shared,
            activity,
            perf,
            console,
            last_report: Instant::from_ticks(0),
            cycles: 0,
        }
    }

    /// Run one cycle.
    pub async fn cycle(&mut self) -> CycleReport {
        let Shared {
            watchdog,
            wakeup,
            diagnostics,
            registers,
        } = self.shared;

        diagnostics.set_verbosity(registers.debug_level());
        watchdog.arm();

        let wake = wakeup.sleep_until(self.config.cycle_period).await;

        let started = self.clock.now();
        self.activity.run_cycle();
        let elapsed = self.clock.now().saturating_duration_since(started);
        self.perf.record(elapsed);

        let console = &mut self.console;
        let drained = diagnostics.drain(|record| console.emit_line(record.text()));
        if drained.lost > 0 {
            warn!("diagnostics: {} records lost", drained.lost);
        }

        let now = self.clock.now();
        let health = if now.saturating_duration_since(self.last_report) > self.config.report_interval
        {
            let report = HealthReport::new(registers.snapshot(), watchdog.recoveries());
            diag!(diagnostics, Level::INFO, "{}", report);
            self.last_report = now;
            Some(report)
        } else {
            None
        };

        self.cycles = self.cycles.wrapping_add(1);
        trace!("cycle {} done", self.cycles);

        CycleReport {
            wake,
            elapsed,
            drained,
            health,
        }
    }

    /// Cycle forever.
    pub async fn run(&mut self) -> ! {
        loop {
            self.cycle().await;
        }
    }

    /// Cycles completed (wrapping).
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// The loop's configuration.
    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// The perf counter fed by the activity.
    pub fn perf(&self) -> &P {
        &self.perf
    }

    /// The periodic activity.
    pub fn activity(&self) -> &A {
        &self.activity
    }

    /// The console sink.
    pub fn console(&self) -> &S {
        &self.console
    }

    /// Mutable access to the console sink.
    pub fn console_mut(&mut self) -> &mut S {
        &mut self.console
    }
}
