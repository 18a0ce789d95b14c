//! Diagnostic severity / verbosity level

use core::fmt;

/// Level tag carried by every record.
///
/// Lower values are more important. A record is accepted when its level is at
/// or below the channel's verbosity, so level 0 always passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Level(u8);

impl Level {
    /// Always emitted (faults, recovery events).
    pub const ALWAYS: Self = Self(0);
    /// Normal operational messages, including the health report.
    pub const INFO: Self = Self(1);
    /// Chatty per-event detail.
    pub const VERBOSE: Self = Self(2);
    /// Everything.
    pub const TRACE: Self = Self(3);

    /// Wrap a raw level.
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// Raw level value.
    pub const fn get(self) -> u8 {
        self.0
    }

    /// `true` if a channel configured with `verbosity` accepts this level.
    pub const fn passes(self, verbosity: u8) -> bool {
        self.0 <= verbosity
    }
}

impl From<u8> for Level {
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}
