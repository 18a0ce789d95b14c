//! Host-facing I2C bus primitives and the periodic link poll.
//!
//! Register access only, no awaits. `configure` runs once from bring-up; the
//! recovery path and the poll run on the interrupt executor.

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_stm32::pac;
use embassy_stm32::pac::gpio::vals::{CnfOut, Mode};
use embassy_stm32::pac::i2c::vals::Addmode;
use platform::{BusPeripheral, Instant, ReconfiguringBus};

use crate::timer::{Callout, Rearm};

/// 7-bit slave address the host addresses us on.
pub const HOST_BUS_ADDRESS: u8 = 0x1a;

/// APB1 clock feeding I2C2, in MHz.
const PCLK1_MHZ: u8 = 36;

/// PB10 (SCL) and PB11 (SDA) as offsets into GPIOB's high control register.
const SCL_PIN: usize = 2;
const SDA_PIN: usize = 3;

/// I2C2 register block.
#[derive(Debug, Default, Clone, Copy)]
pub struct I2c2;

impl BusPeripheral for I2c2 {
    fn configure(&self) {
        // GPIOB's port clock is already on from embassy_stm32::init.
        pac::RCC.apb1enr().modify(|w| w.set_i2c2en(true));
        pac::GPIOB.cr(1).modify(|w| {
            for pin in [SCL_PIN, SDA_PIN] {
                w.set_mode(pin, Mode::OUTPUT50MHZ);
                w.set_cnf_out(pin, CnfOut::ALTOPENDRAIN);
            }
        });

        pac::I2C2.cr1().modify(|w| w.set_pe(false));
        pac::I2C2.cr2().modify(|w| w.set_freq(PCLK1_MHZ));
        pac::I2C2.oar1().write(|w| {
            w.set_addmode(Addmode::BIT7);
            w.set_add(u16::from(HOST_BUS_ADDRESS).wrapping_shl(1));
        });
        pac::I2C2.cr1().modify(|w| {
            w.set_pe(true);
            w.set_ack(true);
        });
    }

    fn pulse_reset(&self) {
        pac::RCC.apb1rstr().modify(|w| w.set_i2c2rst(true));
        pac::RCC.apb1rstr().modify(|w| w.set_i2c2rst(false));
    }

    fn dump_registers(&self) {
        let cr1 = pac::I2C2.cr1().read().0;
        let sr1 = pac::I2C2.sr1().read().0;
        let sr2 = pac::I2C2.sr2().read().0;
        defmt::warn!(
            "i2c2 cr1=0x{:04x} sr1=0x{:04x} sr2=0x{:04x}",
            cr1,
            sr1,
            sr2
        );
    }
}

/// I2C2 slave interface as seen by the watchdog: a reset pulse followed by
/// the same configuration bring-up applies.
pub type I2cBus = ReconfiguringBus<I2c2>;

/// 1 ms poll of the host link receive path.
///
/// Fired periodically by the deadline timer. Counts polls so the host link
/// can detect a dead dispatcher.
#[derive(Debug)]
pub struct LinkPoll {
    polls: AtomicU32,
}

impl LinkPoll {
    /// No polls yet.
    pub const fn new() -> Self {
        Self {
            polls: AtomicU32::new(0),
        }
    }

    /// Polls so far (wrapping).
    pub fn polls(&self) -> u32 {
        self.polls.load(Ordering::Relaxed)
    }
}

impl Default for LinkPoll {
    fn default() -> Self {
        Self::new()
    }
}

impl Callout for LinkPoll {
    fn fire(&self, _now: Instant) -> Rearm {
        self.polls.fetch_add(1, Ordering::Relaxed);
        // Receive completion flags clear on read.
        let _ = pac::I2C2.sr1().read();
        Rearm::Keep
    }
}
