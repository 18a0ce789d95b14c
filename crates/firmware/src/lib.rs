//! IO coprocessor supervisory firmware
//!
//! Sequences subsystem bring-up, runs the fixed-rate output cycle, recovers a
//! stalled peripheral bus and carries diagnostic text out of interrupt
//! context.
//!
//! # Architecture
//!
//! ```text
//! Supervisory loop (supervisor, boot)
//!         ↓
//! Bus watchdog ──▶ Deadline timer ◀── bus poll
//!         ↓               ↓
//! Diagnostic channel (diagnostics crate)
//!         ↓
//! Collaborator traits (platform crate)
//!         ↓
//! Platform HAL (Embassy, STM32)
//! ```
//!
//! Two execution contexts exist: the timer dispatcher (interrupt executor on
//! hardware, a dedicated thread on the host), which fires the bus poll and
//! watchdog recovery callouts, and the supervisory loop. They share only the
//! diagnostic channel, the live registers and the timer table.
//!
//! # Features
//!
//! - `hardware` - Build for STM32F103 target (embassy, defmt over RTT)
//! - `emulator` - Build for desktop testing (tokio, tracing)
//! - `std` - Enable standard library (for emulator and testing)
//!
//! # Examples
//!
//! ## Hardware Target
//!
//! ```bash
//! cargo build --release --target thumbv7m-none-eabi --features hardware
//! ```
//!
//! ## Emulator Target
//!
//! ```bash
//! cargo run --example host_supervisor --features emulator
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Critical correctness: deny these
#![deny(clippy::await_holding_lock)] // holding a blocking Mutex across .await is a bug
#![deny(unsafe_op_in_unsafe_fn)]
// unsafe fn body is not implicitly unsafe block
// Logging discipline
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)] // dbg! should not be left in committed code
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)] // common in Rust crates; not a real issue
#![allow(clippy::missing_errors_doc)] // most errors are self-explanatory
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::future_not_send)] // embassy tasks run on single-core executors

#[macro_use]
mod log;

pub mod boot;
pub mod config;
pub mod exception_handlers;
pub mod health;
pub mod supervisor;
pub mod timer;
pub mod wakeup;
pub mod watchdog;

#[cfg(feature = "emulator")]
pub mod emulator;

#[cfg(feature = "hardware")]
pub mod hardware;

use diagnostics::DiagnosticChannel;
use platform::config::{DIAG_RECORD_BYTES, DIAG_SLOTS};

/// The diagnostic channel shared by interrupt context and the loop.
pub type IsrDiagnostics = DiagnosticChannel<DIAG_SLOTS, DIAG_RECORD_BYTES>;

/// Timer handles in use: bus poll and bus watchdog.
pub const TIMER_SLOTS: usize = 2;

// Re-export key types
pub use boot::{bring_up, BootStep, BusPoll, StartupError, BOOT_SEQUENCE};
pub use config::{ConfigError, SupervisorConfig};
pub use health::HealthReport;
pub use supervisor::{CycleReport, Shared, Supervisor};
pub use timer::{Callout, DeadlineTimer, Rearm, Scheduler, TimerError, TimerHandle};
pub use wakeup::{Wake, WakeupSignal};
pub use watchdog::{BusWatchdog, WatchdogState};
