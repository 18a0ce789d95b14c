//! Collaborator abstractions for the IO coprocessor supervisor
//!
//! The supervisory core (firmware crate) sequences startup, runs the fixed
//! rate output cycle and recovers a stalled peripheral bus. Everything it
//! drives but does not implement lives behind the traits in this crate, so the
//! core can be exercised on the host against the [`mocks`].
//!
//! # Architecture Layers
//!
//! ```text
//! Supervisory core (firmware crate: timer, watchdog, wakeup, loop)
//!         ↓
//! Diagnostics (diagnostics crate: interrupt-safe record ring)
//!         ↓
//! Platform (this crate - collaborator traits, live registers, constants)
//!         ↓
//! Hardware Layer (Embassy HAL + PAC)
//! ```
//!
//! # Collaborators
//!
//! - [`MonotonicClock`] - microsecond monotonic time source
//! - [`BusDriver`] - peripheral bus reset/dump primitives
//! - [`BusPeripheral`] - register-level setup and reset of one bus peripheral
//! - [`PeriodicActivity`] - the one controlled activity (mixer tick)
//! - [`PerfCounter`] - elapsed-time accounting for that activity
//! - [`Board`] - one-shot subsystem bring-up
//! - [`ConsoleSink`] - best-effort line output
//! - [`LiveRegisters`] - configuration surface read every cycle
//!
//! # Features
//!
//! - `std`: host mocks (for testing)
//! - `hardware`: physical hardware marker
//! - `defmt`: enable defmt derives

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)] // hardware accessors — callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod activity;
pub mod board;
pub mod bus;
pub mod clock;
pub mod config;
pub mod console;
pub mod registers;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

pub use activity::{ElapsedPerf, PerfCounter, PeriodicActivity};
pub use board::Board;
pub use bus::{BusDriver, BusPeripheral, ReconfiguringBus};
pub use clock::{MonotonicClock, SystemClock};
pub use console::ConsoleSink;
pub use registers::{LiveRegisters, RegisterSnapshot};

// Time types used across every collaborator signature.
pub use embassy_time::{Duration, Instant};
