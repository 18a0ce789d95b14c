//! Fixed-capacity diagnostic record
//!
//! Text longer than the record capacity is cut at the last UTF-8 character
//! boundary that fits. Truncation is the designed behaviour, not an error.

use core::fmt::{self, Write};

use crate::Level;

/// One level-tagged line of at most `CAP` bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiagnosticRecord<const CAP: usize> {
    level: Level,
    text: heapless::String<CAP>,
}

impl<const CAP: usize> DiagnosticRecord<CAP> {
    /// Record holding `text`, truncated to `CAP` bytes.
    pub fn new(level: Level, text: &str) -> Self {
        let mut record = Self {
            level,
            text: heapless::String::new(),
        };
        record.append(text);
        record
    }

    /// Record holding the formatted `args`, truncated to `CAP` bytes.
    pub fn format(level: Level, args: fmt::Arguments<'_>) -> Self {
        let mut record = Self {
            level,
            text: heapless::String::new(),
        };
        // Truncating writer never reports an error; a Display impl that
        // fails just leaves whatever it wrote so far.
        let _ = record.write_fmt(args);
        record
    }

    /// Rebuild a record from raw slot bytes, dropping any invalid UTF-8 tail
    /// (a slot read while a producer was overwriting it).
    pub(crate) fn from_bytes(level: Level, bytes: &[u8]) -> Self {
        let text = match core::str::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => bytes
                .get(..err.valid_up_to())
                .and_then(|valid| core::str::from_utf8(valid).ok())
                .unwrap_or(""),
        };
        Self::new(level, text)
    }

    /// Severity tag.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Text payload.
    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    /// Maximum payload size in bytes.
    pub const fn capacity() -> usize {
        CAP
    }

    #[allow(clippy::arithmetic_side_effects)] // Safety: len() <= CAP always; cut only decrements while > 0
    fn append(&mut self, s: &str) {
        let room = CAP - self.text.len();
        let mut cut = s.len().min(room);
        while cut > 0 && !s.is_char_boundary(cut) {
            cut -= 1;
        }
        if let Some(head) = s.get(..cut) {
            // `head` fits by construction.
            let _ = self.text.push_str(head);
        }
    }
}

impl<const CAP: usize> Write for DiagnosticRecord<CAP> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.append(s);
        Ok(())
    }
}

impl<const CAP: usize> fmt::Display for DiagnosticRecord<CAP> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}
