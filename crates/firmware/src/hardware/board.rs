//! Board bring-up and the input tasks it starts.

use core::sync::atomic::Ordering;

use embassy_executor::{SpawnError, Spawner};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::AnyPin;
use embassy_stm32::gpio::Output;
use embassy_time::{Duration, Instant, Timer};
use platform::{Board, BusPeripheral};
use thiserror_no_std::Error;

use super::bus::I2c2;
use super::mixer::{CONTROLS, OUTPUT_CHANNELS, OUTPUT_MASK, SAFETY_OFF};
use crate::wakeup::WakeupSignal;

/// Bring-up failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, defmt::Format)]
pub enum BoardError {
    /// The executor had no room for an input task.
    #[error("task spawn failed")]
    Spawn,
    /// An input pin was already handed to its task.
    #[error("input pin already in use")]
    PinTaken,
    /// The channel mask selects no outputs.
    #[error("no output channels selected")]
    NoOutputs,
}

impl From<SpawnError> for BoardError {
    fn from(_: SpawnError) -> Self {
        Self::Spawn
    }
}

/// Pins owned by the board until bring-up hands them to their tasks.
pub struct BoardPins {
    /// Blue status LED.
    pub led_blue: Output<'static, AnyPin>,
    /// Amber status LED.
    pub led_amber: Output<'static, AnyPin>,
    /// Servo rail enable.
    pub servo_power: Output<'static, AnyPin>,
    /// Safety switch (active low).
    pub safety: ExtiInput<'static, AnyPin>,
    /// PPM control input.
    pub ppm: ExtiInput<'static, AnyPin>,
}

/// [`Board`] for the STM32F103 servo coprocessor.
pub struct ServoBoard {
    spawner: Spawner,
    wakeup: &'static WakeupSignal,
    led_blue: Output<'static, AnyPin>,
    led_amber: Output<'static, AnyPin>,
    servo_power: Output<'static, AnyPin>,
    safety: Option<ExtiInput<'static, AnyPin>>,
    ppm: Option<ExtiInput<'static, AnyPin>>,
}

impl ServoBoard {
    /// Board over `pins`; tasks go to `spawner`, safety presses raise `wakeup`.
    pub fn new(spawner: Spawner, pins: BoardPins, wakeup: &'static WakeupSignal) -> Self {
        Self {
            spawner,
            wakeup,
            led_blue: pins.led_blue,
            led_amber: pins.led_amber,
            servo_power: pins.servo_power,
            safety: Some(pins.safety),
            ppm: Some(pins.ppm),
        }
    }
}

impl Board for ServoBoard {
    type Error = BoardError;

    fn init_timer(&mut self) -> Result<(), Self::Error> {
        // TIM2 is started by embassy_stm32::init; the dispatcher task is
        // already running on the interrupt executor.
        defmt::debug!("time driver: TIM2 @ 1 MHz tick");
        Ok(())
    }

    fn enable_output_power(&mut self) -> Result<(), Self::Error> {
        self.led_blue.set_low();
        self.led_amber.set_low();
        self.servo_power.set_high();
        Ok(())
    }

    fn init_safety(&mut self) -> Result<(), Self::Error> {
        let pin = self.safety.take().ok_or(BoardError::PinTaken)?;
        self.spawner.spawn(safety_task(pin, self.wakeup))?;
        Ok(())
    }

    fn init_outputs(&mut self, channel_mask: u8) -> Result<(), Self::Error> {
        if channel_mask == 0 {
            return Err(BoardError::NoOutputs);
        }
        OUTPUT_MASK.store(channel_mask, Ordering::Relaxed);
        Ok(())
    }

    fn spawn_controls(&mut self) -> Result<(), Self::Error> {
        let pin = self.ppm.take().ok_or(BoardError::PinTaken)?;
        self.spawner.spawn(ppm_task(pin))?;
        Ok(())
    }

    fn init_bus(&mut self) -> Result<(), Self::Error> {
        I2c2.configure();
        Ok(())
    }
}

/// Debounced safety switch: each press toggles whether outputs are released
/// and wakes the loop so the change is mixed without waiting a full cycle.
#[embassy_executor::task]
async fn safety_task(mut pin: ExtiInput<'static, AnyPin>, wakeup: &'static WakeupSignal) {
    loop {
        pin.wait_for_falling_edge().await;
        Timer::after_millis(20).await; // debounce
        if pin.is_low() {
            let released = !SAFETY_OFF.load(Ordering::Acquire);
            SAFETY_OFF.store(released, Ordering::Release);
            defmt::info!("safety: outputs {}", if released { "released" } else { "parked" });
            wakeup.raise();
            pin.wait_for_rising_edge().await;
        }
    }
}

/// PPM frame sync gap; any pulse interval longer than this starts a frame.
const PPM_SYNC: Duration = Duration::from_micros(3_000);

/// Decode a PPM pulse train into [`CONTROLS`].
#[embassy_executor::task]
async fn ppm_task(mut pin: ExtiInput<'static, AnyPin>) {
    let mut last_edge = Instant::now();
    let mut channel = OUTPUT_CHANNELS;
    loop {
        pin.wait_for_rising_edge().await;
        let now = Instant::now();
        let width = now.saturating_duration_since(last_edge);
        last_edge = now;

        if width > PPM_SYNC {
            channel = 0;
            continue;
        }
        if channel < OUTPUT_CHANNELS {
            let us = u16::try_from(width.as_micros()).unwrap_or(u16::MAX);
            CONTROLS.set(channel, us);
            channel = channel.saturating_add(1);
        }
    }
}
