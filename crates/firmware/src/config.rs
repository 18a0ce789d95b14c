//! Runtime supervisor configuration
//!
//! Defaults come from [`platform::config`]. Tests and the host emulator
//! override individual fields with the `with_*` setters; [`validate`]
//! rejects combinations the watchdog cannot tolerate.
//!
//! [`validate`]: SupervisorConfig::validate

use platform::config::{
    BUS_POLL_PERIOD_US, CYCLE_PERIOD_US, HEALTH_REPORT_INTERVAL_US, OUTPUT_CHANNEL_MASK,
    WATCHDOG_TIMEOUT_US,
};
use platform::Duration;
use thiserror_no_std::Error;

/// Why a [`SupervisorConfig`] was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A period or timeout is zero.
    #[error("durations must be non-zero")]
    ZeroDuration,
    /// The cycle period is not strictly below the watchdog timeout, so a
    /// healthy cycle would trip the watchdog.
    #[error("cycle period must be shorter than the watchdog timeout")]
    PeriodNotBelowTimeout,
    /// Health reports would be due more often than cycles run.
    #[error("health report interval must be at least one cycle period")]
    ReportBelowPeriod,
}

/// Timing and output parameters for one supervisor instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SupervisorConfig {
    /// Sleep between activity invocations.
    pub cycle_period: Duration,
    /// Bus watchdog timeout, re-armed every cycle.
    pub watchdog_timeout: Duration,
    /// Minimum spacing of health report records.
    pub report_interval: Duration,
    /// Period of the bus receive poll armed at timer init.
    pub bus_poll_period: Duration,
    /// PWM channels configured at bring-up.
    pub output_channel_mask: u8,
}

impl SupervisorConfig {
    /// Configuration built from the compile-time constants.
    pub const fn new() -> Self {
        Self {
            cycle_period: Duration::from_micros(CYCLE_PERIOD_US),
            watchdog_timeout: Duration::from_micros(WATCHDOG_TIMEOUT_US),
            report_interval: Duration::from_micros(HEALTH_REPORT_INTERVAL_US),
            bus_poll_period: Duration::from_micros(BUS_POLL_PERIOD_US),
            output_channel_mask: OUTPUT_CHANNEL_MASK,
        }
    }

    /// Override the cycle period.
    #[must_use]
    pub const fn with_cycle_period(mut self, period: Duration) -> Self {
        self.cycle_period = period;
        self
    }

    /// Override the watchdog timeout.
    #[must_use]
    pub const fn with_watchdog_timeout(mut self, timeout: Duration) -> Self {
        self.watchdog_timeout = timeout;
        self
    }

    /// Override the health report interval.
    #[must_use]
    pub const fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    /// Override the bus poll period.
    #[must_use]
    pub const fn with_bus_poll_period(mut self, period: Duration) -> Self {
        self.bus_poll_period = period;
        self
    }

    /// Override the output channel mask.
    #[must_use]
    pub const fn with_output_channel_mask(mut self, mask: u8) -> Self {
        self.output_channel_mask = mask;
        self
    }

    /// Check the invariants the watchdog and reporter depend on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let zero = Duration::from_ticks(0);
        if [
            self.cycle_period,
            self.watchdog_timeout,
            self.report_interval,
            self.bus_poll_period,
        ]
        .contains(&zero)
        {
            return Err(ConfigError::ZeroDuration);
        }
        if self.cycle_period >= self.watchdog_timeout {
            return Err(ConfigError::PeriodNotBelowTimeout);
        }
        if self.report_interval < self.cycle_period {
            return Err(ConfigError::ReportBelowPeriod);
        }
        Ok(())
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SupervisorConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.cycle_period, Duration::from_millis(20));
        assert_eq!(config.watchdog_timeout, Duration::from_millis(30));
        assert_eq!(config.report_interval, Duration::from_secs(1));
        assert_eq!(config.output_channel_mask, 0xff);
    }

    #[test]
    fn period_equal_to_timeout_is_rejected() {
        let config = SupervisorConfig::new().with_cycle_period(Duration::from_millis(30));
        assert_eq!(config.validate(), Err(ConfigError::PeriodNotBelowTimeout));
    }

    #[test]
    fn zero_poll_period_is_rejected() {
        let config = SupervisorConfig::new().with_bus_poll_period(Duration::from_ticks(0));
        assert_eq!(config.validate(), Err(ConfigError::ZeroDuration));
    }

    #[test]
    fn report_interval_below_period_is_rejected() {
        let config = SupervisorConfig::new().with_report_interval(Duration::from_millis(5));
        assert_eq!(config.validate(), Err(ConfigError::ReportBelowPeriod));
    }
}
