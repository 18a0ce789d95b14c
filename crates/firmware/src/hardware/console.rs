//! Console sink over defmt/RTT.

use platform::ConsoleSink;

/// Writes each console line as a defmt `info` frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefmtConsole;

impl ConsoleSink for DefmtConsole {
    fn emit_line(&mut self, line: &str) {
        defmt::info!("{=str}", line);
    }
}
