//! One-line system health summary

use core::fmt;

use platform::RegisterSnapshot;

/// Snapshot written to the diagnostic channel once per report interval.
///
/// Renders as `d:<level> s=0x<status> a=0x<arming> f=0x<features> r=<recoveries>`,
/// which fits a diagnostic record at any register values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HealthReport {
    /// Register values at the time of the report.
    pub registers: RegisterSnapshot,
    /// Bus watchdog recovery count.
    pub recoveries: u32,
}

impl HealthReport {
    /// Combine a register snapshot with the watchdog counter.
    pub const fn new(registers: RegisterSnapshot, recoveries: u32) -> Self {
        Self {
            registers,
            recoveries,
        }
    }
}

impl fmt::Display for HealthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "d:{} s=0x{:x} a=0x{:x} f=0x{:x} r={}",
            self.registers.debug_level,
            self.registers.status_flags,
            self.registers.arming,
            self.registers.features,
            self.recoveries,
        )
    }
}

#[cfg(test)]
mod tests {
    use diagnostics::DiagnosticRecord;
    use platform::config::DIAG_RECORD_BYTES;

    use super::*;

    #[test]
    fn renders_compact_hex_flags() {
        let report = HealthReport::new(
            RegisterSnapshot {
                debug_level: 1,
                status_flags: 0x41,
                arming: 0x3,
                features: 0,
            },
            2,
        );
        let record = DiagnosticRecord::<64>::format(
            diagnostics::Level::INFO,
            format_args!("{report}"),
        );
        assert_eq!(record.text(), "d:1 s=0x41 a=0x3 f=0x0 r=2");
    }

    #[test]
    fn widest_report_fits_one_record() {
        let report = HealthReport::new(
            RegisterSnapshot {
                debug_level: u8::MAX,
                status_flags: u16::MAX,
                arming: u16::MAX,
                features: u16::MAX,
            },
            u32::MAX,
        );
        let record = DiagnosticRecord::<DIAG_RECORD_BYTES>::format(
            diagnostics::Level::INFO,
            format_args!("{report}"),
        );
        assert!(record.text().ends_with("r=4294967295"));
    }
}
