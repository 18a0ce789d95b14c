//! Peripheral bus driver boundary
//!
//! The supervisor only ever resets or dumps the bus, and only from the
//! watchdog recovery path. The driver's transfer logic is not visible here.

/// Primitives the bus watchdog needs from the monitored bus.
///
/// Both methods are invoked from the timer dispatch context, so they take
/// `&self`, must not block and must complete in bounded time. Neither has a
/// return path: a reset that does not clear the stall simply shows up as
/// another watchdog trip.
pub trait BusDriver: Sync {
    /// Abort in-flight transfers and return the bus to its idle state.
    fn reset_bus(&self);

    /// Emit the driver's internal state for post-mortem inspection.
    fn dump_bus_state(&self);
}

impl<B: BusDriver + ?Sized> BusDriver for &B {
    fn reset_bus(&self) {
        (**self).reset_bus();
    }

    fn dump_bus_state(&self) {
        (**self).dump_bus_state();
    }
}

/// Register-level control of one bus peripheral.
///
/// Split from [`BusDriver`] so that first bring-up and post-reset recovery
/// apply the same configuration.
pub trait BusPeripheral: Sync {
    /// Clock, pin and protocol setup that leaves the peripheral enabled.
    fn configure(&self);

    /// Pulse the peripheral's reset line. Clears every register.
    fn pulse_reset(&self);

    /// Emit the peripheral's status registers.
    fn dump_registers(&self);
}

/// [`BusDriver`] that re-applies the peripheral configuration after every
/// reset pulse.
#[derive(Debug, Default)]
pub struct ReconfiguringBus<P> {
    peripheral: P,
}

impl<P> ReconfiguringBus<P> {
    /// Wrap `peripheral`.
    pub const fn new(peripheral: P) -> Self {
        Self { peripheral }
    }

    /// The wrapped peripheral.
    pub fn peripheral(&self) -> &P {
        &self.peripheral
    }
}

impl<P: BusPeripheral> ReconfiguringBus<P> {
    /// Initial configuration, as run at bring-up.
    pub fn configure(&self) {
        self.peripheral.configure();
    }
}

impl<P: BusPeripheral> BusDriver for ReconfiguringBus<P> {
    fn reset_bus(&self) {
        self.peripheral.pulse_reset();
        self.peripheral.configure();
    }

    fn dump_bus_state(&self) {
        self.peripheral.dump_registers();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recording {
        calls: Mutex<Vec<&'static str>>,
    }

    impl Recording {
        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl BusPeripheral for Recording {
        fn configure(&self) {
            self.calls.lock().unwrap().push("configure");
        }

        fn pulse_reset(&self) {
            self.calls.lock().unwrap().push("pulse_reset");
        }

        fn dump_registers(&self) {
            self.calls.lock().unwrap().push("dump_registers");
        }
    }

    #[test]
    fn reset_reconfigures_after_the_pulse() {
        let bus = ReconfiguringBus::new(Recording::default());

        bus.reset_bus();

        assert_eq!(bus.peripheral().calls(), ["pulse_reset", "configure"]);
    }

    #[test]
    fn every_recovery_leaves_the_peripheral_configured() {
        let bus = ReconfiguringBus::new(Recording::default());
        bus.configure();

        for _ in 0..3 {
            bus.dump_bus_state();
            bus.reset_bus();
        }

        let calls = bus.peripheral().calls();
        assert_eq!(calls.last(), Some(&"configure"));
        assert_eq!(calls.iter().filter(|&&c| c == "configure").count(), 4);
        assert_eq!(calls.iter().filter(|&&c| c == "pulse_reset").count(), 3);
        assert_eq!(
            calls.get(1..4),
            Some(&["dump_registers", "pulse_reset", "configure"][..])
        );
    }
}
