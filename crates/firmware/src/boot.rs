//! One-shot startup sequence.
//!
//! The diagnostic channel's verbosity is loaded from the live registers
//! before any step runs, so records written during bring-up are filtered by
//! the configured debug level rather than the channel's default of 0.
//!
//! Initialization order (MUST be respected: later steps drive hardware the
//! earlier steps configure):
//!   1. Timer: start the deadline timer, then arm the periodic bus poll
//!   2. Output power: status LEDs off, servo rail on
//!   3. Safety: safety switch input handler
//!   4. Outputs: PWM channels selected by the channel mask
//!   5. Controls: task feeding the periodic activity
//!   6. Bus: host-facing peripheral bus
//!
//! Any failing step is fatal. Nothing after it runs, the failure is written
//! to the console, and the caller halts. Partially initialised outputs are
//! never driven.

use core::fmt;

use diagnostics::{diag, Level};
use platform::config::{startup_banner, APP_NAME};
use platform::{Board, ConsoleSink, LiveRegisters};
use thiserror_no_std::Error;

use crate::config::SupervisorConfig;
use crate::timer::{Callout, Scheduler, TimerHandle};
use crate::IsrDiagnostics;

/// One step of [`bring_up`], in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootStep {
    /// Deadline timer hardware and the periodic bus poll.
    InitTimer,
    /// Status LEDs off, output rail power on.
    EnableOutputPower,
    /// Safety switch input.
    InitSafety,
    /// PWM output channels.
    InitOutputs,
    /// Control input task.
    SpawnControls,
    /// Host-facing peripheral bus.
    InitBus,
}

/// Steps in the order [`bring_up`] runs them.
pub const BOOT_SEQUENCE: [BootStep; 6] = [
    BootStep::InitTimer,
    BootStep::EnableOutputPower,
    BootStep::InitSafety,
    BootStep::InitOutputs,
    BootStep::SpawnControls,
    BootStep::InitBus,
];

impl BootStep {
    /// Stable lowercase name, used in console output.
    pub const fn name(self) -> &'static str {
        match self {
            Self::InitTimer => "init_timer",
            Self::EnableOutputPower => "enable_output_power",
            Self::InitSafety => "init_safety",
            Self::InitOutputs => "init_outputs",
            Self::SpawnControls => "spawn_controls",
            Self::InitBus => "init_bus",
        }
    }
}

impl fmt::Display for BootStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fatal bring-up failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("startup failed at {step}")]
pub struct StartupError {
    /// The step that failed; later steps did not run.
    pub step: BootStep,
}

/// The periodic receive poll armed right after timer init.
#[derive(Clone, Copy)]
pub struct BusPoll<'a> {
    /// Handle dedicated to the poll.
    pub handle: TimerHandle,
    /// Poll work, fired every `bus_poll_period`.
    pub callout: &'a dyn Callout,
}

impl fmt::Debug for BusPoll<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusPoll")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

/// Run every [`BOOT_SEQUENCE`] step against `board`.
///
/// Loads `diagnostics`' verbosity from `registers` first, then writes the
/// startup banner and the current debug level to `console` along the way.
/// On failure writes `"<APP_NAME>: startup failed at <step>"` and returns the
/// failing step; the caller must not enter the main loop.
pub fn bring_up<'a, B, S>(
    board: &mut B,
    scheduler: &dyn Scheduler<'a>,
    poll: BusPoll<'a>,
    config: &SupervisorConfig,
    registers: &LiveRegisters,
    diagnostics: &IsrDiagnostics,
    console: &mut S,
) -> Result<(), StartupError>
where
    B: Board,
    S: ConsoleSink,
{
    diagnostics.set_verbosity(registers.debug_level());

    let result = run_steps(board, scheduler, poll, config, registers, diagnostics, console);
    if let Err(err) = result {
        let mut line = heapless::String::<64>::new();
        let _ = fmt::write(&mut line, format_args!("{APP_NAME}: {err}"));
        console.emit_line(&line);
    }
    result
}

fn run_steps<'a, B, S>(
    board: &mut B,
    scheduler: &dyn Scheduler<'a>,
    poll: BusPoll<'a>,
    config: &SupervisorConfig,
    registers: &LiveRegisters,
    diagnostics: &IsrDiagnostics,
    console: &mut S,
) -> Result<(), StartupError>
where
    B: Board,
    S: ConsoleSink,
{
    step(BootStep::InitTimer, board.init_timer())?;
    scheduler.arm_every(
        poll.handle,
        config.bus_poll_period,
        config.bus_poll_period,
        poll.callout,
    );

    console.emit_line(startup_banner());

    step(BootStep::EnableOutputPower, board.enable_output_power())?;
    step(BootStep::InitSafety, board.init_safety())?;
    step(
        BootStep::InitOutputs,
        board.init_outputs(config.output_channel_mask),
    )?;
    step(BootStep::SpawnControls, board.spawn_controls())?;

    let mut line = heapless::String::<32>::new();
    let _ = fmt::write(
        &mut line,
        format_args!("debug_level={}", registers.debug_level()),
    );
    console.emit_line(&line);

    step(BootStep::InitBus, board.init_bus())?;

    diag!(diagnostics, Level::INFO, "bring-up complete");
    info!("bring-up complete");
    Ok(())
}

fn step<E: fmt::Debug>(step: BootStep, result: Result<(), E>) -> Result<(), StartupError> {
    match result {
        Ok(()) => {
            debug!("{} ok", step);
            Ok(())
        }
        Err(err) => {
            log_board_error(step, &err);
            Err(StartupError { step })
        }
    }
}

fn log_board_error<E: fmt::Debug>(step: BootStep, err: &E) {
    #[cfg(feature = "defmt")]
    defmt::error!("{} failed: {}", step, defmt::Debug2Format(err));

    #[cfg(all(feature = "tracing", not(feature = "defmt")))]
    tracing::error!(%step, error = ?err, "bring-up step failed");

    #[cfg(not(any(feature = "defmt", feature = "tracing")))]
    let _ = (step, err);
}
