//! STM32F103 collaborators for the supervisory core.
//!
//! # Pin assignments
//!
//! These document the target board; change them to match your PCB before
//! flashing.
//!
//! | Signal         | MCU pin | Notes                              |
//! |----------------|---------|------------------------------------|
//! | Blue LED       | PB14    | Active-high, forced off at power-up |
//! | Amber LED      | PB15    | Active-high, forced off at power-up |
//! | Servo power    | PC13    | Output rail enable                 |
//! | Safety switch  | PB5     | Active-low, internal pull-up (EXTI5) |
//! | PPM input      | PA0     | Rising-edge pulse train (EXTI0)    |
//! | Host bus       | I2C2    | PB10 SCL / PB11 SDA                |
//!
//! Only compiled with the `hardware` feature.

pub mod board;
pub mod bus;
pub mod console;
pub mod mixer;

pub use board::{BoardError, BoardPins, ServoBoard};
pub use bus::{I2c2, I2cBus, LinkPoll, HOST_BUS_ADDRESS};
pub use console::DefmtConsole;
pub use mixer::{MixerTick, CONTROLS, OUTPUTS, OUTPUT_CHANNELS, OUTPUT_MASK, SAFETY_OFF};
