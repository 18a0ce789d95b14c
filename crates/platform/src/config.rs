//! Application configuration and constants
//!
//! Central timing and sizing values for the supervisor. Runtime code builds
//! its `SupervisorConfig` from these defaults rather than hardcoding values.

/// The application name
pub const APP_NAME: &str = "IOSUP";

/// Application version (synchronized with Cargo.toml)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Supervisory loop cadence (~50 Hz output update).
pub const CYCLE_PERIOD_US: u64 = 20_000;

/// Bus watchdog timeout. Must stay above [`CYCLE_PERIOD_US`] or the watchdog
/// trips on every healthy cycle.
pub const WATCHDOG_TIMEOUT_US: u64 = 30_000;

/// Minimum spacing between two health report lines.
pub const HEALTH_REPORT_INTERVAL_US: u64 = 1_000_000;

/// Period of the peripheral link receive poll armed at timer init.
pub const BUS_POLL_PERIOD_US: u64 = 1_000;

/// PWM output channels configured at bring-up (all eight).
pub const OUTPUT_CHANNEL_MASK: u8 = 0xff;

/// Slots in the interrupt-safe diagnostic ring.
///
/// Every slot is a static buffer carved out of the memory the mixer also
/// needs; keep this small.
pub const DIAG_SLOTS: usize = 2;

/// Maximum text bytes per diagnostic record; longer text is truncated.
pub const DIAG_RECORD_BYTES: usize = 50;

/// Startup banner line
pub const fn startup_banner() -> &'static str {
    "IOSUP: starting"
}
