//! Output mixer tick.
//!
//! Copies the latest control inputs to the output table when the safety
//! switch has released the outputs, and parks every output otherwise.

use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU8, Ordering};

use platform::PeriodicActivity;

/// PWM output channels on the board.
pub const OUTPUT_CHANNELS: usize = 8;

/// Pulse width written to parked outputs (microseconds).
pub const PARKED_US: u16 = 900;

/// Latest control inputs (microseconds), written by the controls task.
pub static CONTROLS: ControlInputs = ControlInputs::new();

/// Pulse widths staged for the PWM timers (microseconds), written by the mixer.
pub static OUTPUTS: [AtomicU16; OUTPUT_CHANNELS] = [const { AtomicU16::new(PARKED_US) }; OUTPUT_CHANNELS];

/// Channels enabled at bring-up; bit `n` enables channel `n`.
pub static OUTPUT_MASK: AtomicU8 = AtomicU8::new(0);

/// `true` once the safety switch has released the outputs.
pub static SAFETY_OFF: AtomicBool = AtomicBool::new(false);

/// Control values shared between the controls task and the mixer.
#[derive(Debug)]
pub struct ControlInputs {
    values: [AtomicU16; OUTPUT_CHANNELS],
}

impl ControlInputs {
    const fn new() -> Self {
        Self {
            values: [const { AtomicU16::new(PARKED_US) }; OUTPUT_CHANNELS],
        }
    }

    /// Store a new value for `channel`; out-of-range channels are ignored.
    pub fn set(&self, channel: usize, value_us: u16) {
        if let Some(slot) = self.values.get(channel) {
            slot.store(value_us, Ordering::Relaxed);
        }
    }

    fn get(&self, channel: usize) -> u16 {
        self.values
            .get(channel)
            .map_or(PARKED_US, |slot| slot.load(Ordering::Relaxed))
    }
}

/// The periodic activity driven by the supervisory loop.
#[derive(Debug, Default)]
pub struct MixerTick;

impl MixerTick {
    /// Mixer with no state of its own.
    pub const fn new() -> Self {
        Self
    }
}

impl PeriodicActivity for MixerTick {
    fn run_cycle(&mut self) {
        let released = SAFETY_OFF.load(Ordering::Acquire);
        let mask = OUTPUT_MASK.load(Ordering::Relaxed);
        for (channel, output) in OUTPUTS.iter().enumerate() {
            let enabled = u32::try_from(channel)
                .ok()
                .and_then(|shift| mask.checked_shr(shift))
                .is_some_and(|bits| bits & 1 == 1);
            let value = if released && enabled {
                CONTROLS.get(channel)
            } else {
                PARKED_US
            };
            output.store(value, Ordering::Relaxed);
        }
    }
}
