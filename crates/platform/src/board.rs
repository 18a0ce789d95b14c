//! One-shot subsystem bring-up
//!
//! Each method is called exactly once, in declaration order, by the boot
//! sequence in the firmware crate. A failure at any step is fatal: partially
//! initialised outputs are unsafe to drive, so nothing after the failing step
//! runs.

/// Board-level initialisation hooks.
pub trait Board {
    /// Error type
    type Error: core::fmt::Debug;

    /// Start the high-resolution timer hardware backing the deadline timer.
    fn init_timer(&mut self) -> Result<(), Self::Error>;

    /// Force status LEDs off, then switch on output (servo rail) power.
    fn enable_output_power(&mut self) -> Result<(), Self::Error>;

    /// Start the safety switch input handler.
    fn init_safety(&mut self) -> Result<(), Self::Error>;

    /// Configure the PWM output channels selected by `channel_mask`.
    fn init_outputs(&mut self, channel_mask: u8) -> Result<(), Self::Error>;

    /// Start the control-input task that feeds the periodic activity.
    fn spawn_controls(&mut self) -> Result<(), Self::Error>;

    /// Bring the host-facing peripheral bus online.
    fn init_bus(&mut self) -> Result<(), Self::Error>;
}
