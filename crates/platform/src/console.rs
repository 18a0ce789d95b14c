//! Console line output

/// Best-effort text line sink (serial console, RTT, host log).
///
/// Called only from the supervisory loop. Implementations append their own
/// line terminator.
pub trait ConsoleSink {
    /// Write one line of text.
    fn emit_line(&mut self, line: &str);
}

impl<S: ConsoleSink + ?Sized> ConsoleSink for &mut S {
    fn emit_line(&mut self, line: &str) {
        (**self).emit_line(line);
    }
}
