//! Host Supervisor
//!
//! Runs the full supervisory core on the desktop: deadline timer dispatch on
//! its own thread, the loop on tokio, and a mixer that stalls every couple of
//! seconds so the watchdog recovery shows up in the console output.
//!
//! Run with: cargo run --example host_supervisor --features emulator
//!
//! Environment:
//! - `CYCLES`      cycles to run before exiting (default 500, about 10 s)
//! - `DEBUG_LEVEL` diagnostic verbosity (default 1)
//! - `FAIL_AT`     bring-up step to fail, e.g. `init_safety`
//! - `RUST_LOG`    tracing filter (default `info`)

use std::time::Duration as StdDuration;

use firmware::emulator::{
    init_tracing, SimulatedBoard, SimulatedBus, SimulatedPoll, StallingMixer, TracingConsole,
};
use firmware::{
    bring_up, BusPoll, BusWatchdog, DeadlineTimer, IsrDiagnostics, Shared, Supervisor,
    SupervisorConfig, Wake, WakeupSignal, TIMER_SLOTS,
};
use platform::{ElapsedPerf, LiveRegisters, SystemClock};
use static_cell::StaticCell;

static TIMER: DeadlineTimer<'static, SystemClock, TIMER_SLOTS> = DeadlineTimer::new(SystemClock);
static DIAGNOSTICS: IsrDiagnostics = IsrDiagnostics::new();
static REGISTERS: LiveRegisters = LiveRegisters::new();
static WAKEUP: WakeupSignal = WakeupSignal::new();
static POLL: SimulatedPoll = SimulatedPoll::new();
static BUS: SimulatedBus = SimulatedBus::new();
static WATCHDOG: StaticCell<BusWatchdog<'static, &'static SimulatedBus>> = StaticCell::new();

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn fatal(what: &str, err: &dyn core::fmt::Display) -> ! {
    tracing::error!(error = %err, "{what}");
    std::process::exit(1)
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_tracing();

    let cycles: u32 = env_or("CYCLES", 500);
    REGISTERS.set_debug_level(env_or("DEBUG_LEVEL", 1));

    let config = SupervisorConfig::default();
    if let Err(err) = config.validate() {
        fatal("invalid configuration", &err);
    }

    // Dispatch context: a dedicated OS thread standing in for the interrupt
    // executor.
    std::thread::Builder::new()
        .name("timer-dispatch".into())
        .spawn(|| {
            embassy_futures::block_on(TIMER.run());
        })?;

    let (poll_handle, watchdog_handle) = match (TIMER.allocate(), TIMER.allocate()) {
        (Ok(poll), Ok(watchdog)) => (poll, watchdog),
        (Err(err), _) | (_, Err(err)) => fatal("timer allocation", &err),
    };

    let mut board = match std::env::var("FAIL_AT") {
        Ok(step) => SimulatedBoard::failing_at(Box::leak(step.into_boxed_str())),
        Err(_) => SimulatedBoard::new(),
    };
    let mut console = TracingConsole;
    let poll = BusPoll {
        handle: poll_handle,
        callout: &POLL,
    };
    let started = bring_up(
        &mut board,
        &TIMER,
        poll,
        &config,
        &REGISTERS,
        &DIAGNOSTICS,
        &mut console,
    );
    if let Err(err) = started {
        fatal("bring-up", &err);
    }

    let watchdog: &'static BusWatchdog<'static, &'static SimulatedBus> = WATCHDOG.init(
        BusWatchdog::new(&TIMER, watchdog_handle, &BUS, &DIAGNOSTICS, config.watchdog_timeout),
    );

    // An operator poking the loop twice a second. Without it the loop still
    // runs on its fixed cadence.
    let raiser = std::thread::Builder::new()
        .name("operator".into())
        .spawn(|| loop {
            std::thread::sleep(StdDuration::from_millis(500));
            WAKEUP.raise();
        });
    if let Err(err) = raiser {
        tracing::warn!(error = %err, "wakeup source unavailable, running on fixed cadence");
    }

    let shared = Shared {
        watchdog,
        wakeup: &WAKEUP,
        diagnostics: &DIAGNOSTICS,
        registers: &REGISTERS,
    };
    let mut supervisor = Supervisor::new(
        config,
        SystemClock,
        shared,
        StallingMixer::new(100, StdDuration::from_millis(75)),
        ElapsedPerf::new("mix"),
        console,
    );

    let mut raised = 0u32;
    for _ in 0..cycles {
        let report = supervisor.cycle().await;
        if report.wake == Wake::Raised {
            raised = raised.saturating_add(1);
        }
    }

    let perf = supervisor.perf();
    tracing::info!(
        cycles = supervisor.cycles(),
        raised,
        recoveries = watchdog.recoveries(),
        bus_resets = BUS.resets(),
        polls = POLL.polls(),
        lost = DIAGNOSTICS.lost(),
        "done"
    );
    tracing::info!(
        name = perf.name(),
        events = perf.events(),
        max = ?perf.max(),
        mean = ?perf.mean(),
        "perf"
    );
    Ok(())
}
