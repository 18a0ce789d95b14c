//! Cortex-M exception handlers for the IO coprocessor.
//!
//! - **HardFault**: memory access violations (bus fault), illegal
//!   instructions, or a stack that grew into `.bss`. On the Cortex-M3 there
//!   is no MPU guard configured, so a fault here usually means corrupted
//!   state rather than a clean overflow trap.
//!
//! Once a fault is taken the outputs are in an unknown state; the handler
//! reports the stacked frame and halts. It never attempts to resume the
//! supervisory loop.
//!
//! # Hardware-only handler
//!
//! The `#[cortex_m_rt::exception]` attribute requires ARM target intrinsics and
//! is therefore gated behind `#[cfg(feature = "hardware")]`. The module itself
//! (and `HARDFAULT_DEFINED`) compiles unconditionally so host tests can verify
//! the module exists without needing an ARM toolchain.

#![allow(clippy::doc_markdown)] // Exception handler docs use hardware terminology (HardFault) as plain text

/// Marker constant: `true` when this module (and, on hardware, the HardFault
/// handler below) is compiled into the image.
pub const HARDFAULT_DEFINED: bool = true;

/// HardFault exception handler (hardware target only).
///
/// Outputs the stacked PC and LR via defmt/RTT, then halts. Without a
/// debugger attached the output is discarded but the halt still keeps a
/// faulted core from driving the outputs.
///
/// # Safety
///
/// This function must never return: returning from a HardFault handler is
/// undefined behavior on Cortex-M. The `-> !` return type enforces this.
#[cfg(feature = "hardware")]
#[cortex_m_rt::exception]
#[allow(unsafe_code)]
unsafe fn HardFault(ef: &cortex_m_rt::ExceptionFrame) -> ! {
    defmt::error!(
        "HardFault: pc=0x{:08X} lr=0x{:08X} xpsr=0x{:08X}",
        ef.pc(),
        ef.lr(),
        ef.xpsr()
    );
    loop {
        cortex_m::asm::bkpt();
    }
}
