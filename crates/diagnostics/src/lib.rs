//! Interrupt-safe diagnostic text channel
//!
//! A fixed-capacity ring of short, severity-tagged text records. Producers may
//! run in interrupt context (timer callouts, bus layer); the single consumer is
//! the supervisory loop, which drains records to the console once per cycle.
//!
//! The channel is lossy: a producer that outruns the consumer overwrites the
//! oldest unread record, and the next drain reports how many were lost. It
//! never blocks, never allocates and has no error path.
//!
//! ```
//! use diagnostics::{diag, DiagnosticChannel, Level};
//!
//! static CHANNEL: DiagnosticChannel<4, 32> = DiagnosticChannel::new();
//!
//! CHANNEL.set_verbosity(1);
//! diag!(CHANNEL, Level::INFO, "bus reset r={}", 3);
//!
//! let mut out = heapless::Vec::<heapless::String<32>, 4>::new();
//! let report = CHANNEL.drain(|record| {
//!     let _ = out.push(record.text().try_into().unwrap_or_default());
//! });
//! assert_eq!(report.delivered, 1);
//! assert_eq!(out[0].as_str(), "bus reset r=3");
//! ```
#![cfg_attr(not(test), no_std)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod level;
pub mod record;

pub use channel::{DiagnosticChannel, DrainReport};
pub use level::Level;
pub use record::DiagnosticRecord;

/// Format a record into a [`DiagnosticChannel`].
///
/// The verbosity check runs before any formatting, so a filtered-out call
/// costs one relaxed atomic load.
///
/// ```
/// use diagnostics::{diag, DiagnosticChannel, Level};
///
/// let channel: DiagnosticChannel<2, 16> = DiagnosticChannel::new();
/// diag!(channel, Level::ALWAYS, "RESETTING");
/// assert_eq!(channel.pending(), 1);
/// ```
#[macro_export]
macro_rules! diag {
    ($channel:expr, $level:expr, $($arg:tt)+) => {
        $channel.write($level, ::core::format_args!($($arg)+))
    };
}
