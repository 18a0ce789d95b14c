//! Live configuration register surface
//!
//! The host link writes these registers at any time; the supervisory loop
//! reads them once per cycle. The loop attaches no meaning to the flag
//! encodings, it only reports them.

use core::sync::atomic::{AtomicU16, AtomicU8, Ordering};

/// Registers shared between the host link and the supervisory loop.
///
/// Each field has a single writer (the host link), so relaxed loads and stores
/// are sufficient; a cycle may observe a value one write stale.
#[derive(Debug)]
pub struct LiveRegisters {
    debug_level: AtomicU8,
    status_flags: AtomicU16,
    arming: AtomicU16,
    features: AtomicU16,
}

/// A point-in-time copy of [`LiveRegisters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterSnapshot {
    /// Diagnostic verbosity threshold.
    pub debug_level: u8,
    /// Status flag word.
    pub status_flags: u16,
    /// Arming flag word.
    pub arming: u16,
    /// Setup feature flag word.
    pub features: u16,
}

impl LiveRegisters {
    /// All registers zeroed (verbosity 0: only level-0 records pass).
    pub const fn new() -> Self {
        Self {
            debug_level: AtomicU8::new(0),
            status_flags: AtomicU16::new(0),
            arming: AtomicU16::new(0),
            features: AtomicU16::new(0),
        }
    }

    /// Current diagnostic verbosity.
    pub fn debug_level(&self) -> u8 {
        self.debug_level.load(Ordering::Relaxed)
    }

    /// Set the diagnostic verbosity.
    pub fn set_debug_level(&self, level: u8) {
        self.debug_level.store(level, Ordering::Relaxed);
    }

    /// Current status flags.
    pub fn status_flags(&self) -> u16 {
        self.status_flags.load(Ordering::Relaxed)
    }

    /// Replace the status flags.
    pub fn set_status_flags(&self, flags: u16) {
        self.status_flags.store(flags, Ordering::Relaxed);
    }

    /// Current arming flags.
    pub fn arming(&self) -> u16 {
        self.arming.load(Ordering::Relaxed)
    }

    /// Replace the arming flags.
    pub fn set_arming(&self, flags: u16) {
        self.arming.store(flags, Ordering::Relaxed);
    }

    /// Current feature flags.
    pub fn features(&self) -> u16 {
        self.features.load(Ordering::Relaxed)
    }

    /// Replace the feature flags.
    pub fn set_features(&self, flags: u16) {
        self.features.store(flags, Ordering::Relaxed);
    }

    /// Read every register once.
    pub fn snapshot(&self) -> RegisterSnapshot {
        RegisterSnapshot {
            debug_level: self.debug_level(),
            status_flags: self.status_flags(),
            arming: self.arming(),
            features: self.features(),
        }
    }
}

impl Default for LiveRegisters {
    fn default() -> Self {
        Self::new()
    }
}
