//! Lock-free, lossy ring of diagnostic records.
//!
//! `DiagnosticChannel<N, CAP>` holds up to `N` records of at most `CAP` bytes
//! each without heap allocation. It is a single-consumer structure: producers
//! may be interrupt handlers (and may preempt a producer running in thread
//! mode), the consumer is the supervisory loop.
//!
//! # Constraints
//!
//! - `N` must be a power of two and at least 2 (checked at compile time) so
//!   that wrapping `u32` sequence numbers map onto slots consistently. This
//!   is narrower than "any `N >= 2`": a 3-slot ring would jump slots when the
//!   sequence wraps at `2^32`, so such shapes are rejected rather than
//!   supported with a second pair of modulo-`N` cursors.
//! - No mutex, no critical section. Every producer claims its own slot with a
//!   single `fetch_add` on the write sequence; the consumer only ever advances
//!   its own counters.
//! - A producer that outruns the consumer overwrites the oldest unread slot.
//!   `drain` delivers the newest `min(outstanding, N)` records and reports the
//!   rest as lost.
//!
//! Slot bytes are stored in atomics, so a drain that races a producer reading
//! the same slot sees stale or mixed text, never undefined behaviour.

use core::fmt;
use core::sync::atomic::{AtomicU32, AtomicU8, AtomicUsize, Ordering};

use crate::{DiagnosticRecord, Level};

/// Outcome of one [`DiagnosticChannel::drain`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DrainReport {
    /// Records handed to the emit callback.
    pub delivered: u32,
    /// Records overwritten before they could be drained.
    pub lost: u32,
}

impl DrainReport {
    /// `true` when the drain found nothing outstanding.
    pub fn is_empty(&self) -> bool {
        self.delivered == 0 && self.lost == 0
    }
}

struct Slot<const CAP: usize> {
    level: AtomicU8,
    len: AtomicUsize,
    bytes: [AtomicU8; CAP],
}

impl<const CAP: usize> Slot<CAP> {
    const fn new() -> Self {
        Self {
            level: AtomicU8::new(0),
            len: AtomicUsize::new(0),
            bytes: [const { AtomicU8::new(0) }; CAP],
        }
    }

    fn store(&self, record: &DiagnosticRecord<CAP>) {
        let text = record.text().as_bytes();
        for (cell, &byte) in self.bytes.iter().zip(text) {
            cell.store(byte, Ordering::Relaxed);
        }
        self.len.store(text.len(), Ordering::Relaxed);
        self.level.store(record.level().get(), Ordering::Relaxed);
    }

    fn load(&self) -> DiagnosticRecord<CAP> {
        let len = self.len.load(Ordering::Relaxed).min(CAP);
        let mut bytes = heapless::Vec::<u8, CAP>::new();
        for cell in self.bytes.iter().take(len) {
            // take(len) with len <= CAP: push cannot fail.
            let _ = bytes.push(cell.load(Ordering::Relaxed));
        }
        DiagnosticRecord::from_bytes(Level::new(self.level.load(Ordering::Relaxed)), &bytes)
    }
}

/// Fixed-capacity, overwrite-oldest ring of [`DiagnosticRecord`]s.
///
/// `new` is `const`, so channels normally live in a `static` and are shared by
/// reference between interrupt handlers and the main loop.
///
/// Only power-of-two slot counts of at least 2 are accepted:
///
/// ```
/// use diagnostics::DiagnosticChannel;
///
/// let channel: DiagnosticChannel<8, 16> = DiagnosticChannel::new();
/// assert_eq!(channel.capacity(), 8);
/// ```
///
/// ```compile_fail
/// use diagnostics::DiagnosticChannel;
///
/// let channel: DiagnosticChannel<3, 16> = DiagnosticChannel::new();
/// ```
pub struct DiagnosticChannel<const N: usize, const CAP: usize> {
    slots: [Slot<CAP>; N],
    /// Write sequence: next slot a producer will claim (producers only).
    claimed: AtomicU32,
    /// Records fully written (producers only).
    produced: AtomicU32,
    /// Value of `produced` at the last drain (consumer only).
    consumed: AtomicU32,
    /// Cumulative records overwritten before being drained (consumer only).
    lost: AtomicU32,
    /// Highest level accepted by `write`.
    verbosity: AtomicU8,
}

impl<const N: usize, const CAP: usize> DiagnosticChannel<N, CAP> {
    const SHAPE: () = assert!(
        N >= 2 && N.is_power_of_two(),
        "DiagnosticChannel needs a power-of-two slot count of at least 2"
    );

    #[allow(clippy::cast_possible_truncation)] // N is a small slot count
    const CAPACITY: u32 = N as u32;

    /// Empty channel with zeroed counters and verbosity 0.
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::SHAPE;
        Self {
            slots: [const { Slot::new() }; N],
            claimed: AtomicU32::new(0),
            produced: AtomicU32::new(0),
            consumed: AtomicU32::new(0),
            lost: AtomicU32::new(0),
            verbosity: AtomicU8::new(0),
        }
    }

    /// Set the highest level [`write`][Self::write] accepts.
    pub fn set_verbosity(&self, verbosity: u8) {
        self.verbosity.store(verbosity, Ordering::Relaxed);
    }

    /// Highest level currently accepted.
    pub fn verbosity(&self) -> u8 {
        self.verbosity.load(Ordering::Relaxed)
    }

    /// `true` if a record at `level` would be stored.
    pub fn accepts(&self, level: Level) -> bool {
        level.passes(self.verbosity())
    }

    /// Format `args` into the next slot.
    ///
    /// Callable from any context, including interrupt handlers: no allocation,
    /// no locking, bounded time. Records above the configured verbosity are
    /// dropped before any formatting happens. When the ring is full the
    /// oldest unread record is overwritten.
    pub fn write(&self, level: Level, args: fmt::Arguments<'_>) {
        if !self.accepts(level) {
            return;
        }
        let record = DiagnosticRecord::<CAP>::format(level, args);
        self.push(&record);
    }

    /// Store an already-built record, subject to the same verbosity filter.
    pub fn write_record(&self, record: &DiagnosticRecord<CAP>) {
        if self.accepts(record.level()) {
            self.push(record);
        }
    }

    fn push(&self, record: &DiagnosticRecord<CAP>) {
        // fetch_add wraps on overflow; N divides 2^32 so the slot mapping
        // stays continuous across the wrap.
        let seq = self.claimed.fetch_add(1, Ordering::Relaxed);
        if let Some(slot) = self.slot(seq) {
            slot.store(record);
        }
        self.produced.fetch_add(1, Ordering::Release);
    }

    /// Emit every retained record, oldest first, and mark the ring consumed.
    ///
    /// Must only be called from the single consumer context. Delivers
    /// `min(produced - consumed, N)` records; anything older was overwritten
    /// and is counted in [`DrainReport::lost`]. Returns immediately when
    /// nothing is outstanding.
    pub fn drain<F>(&self, mut emit: F) -> DrainReport
    where
        F: FnMut(&DiagnosticRecord<CAP>),
    {
        let produced = self.produced.load(Ordering::Acquire);
        let consumed = self.consumed.load(Ordering::Relaxed);
        let outstanding = produced.wrapping_sub(consumed);
        if outstanding == 0 {
            return DrainReport::default();
        }

        let pending = outstanding.min(Self::CAPACITY);
        let lost = outstanding.wrapping_sub(pending);

        let mut seq = produced.wrapping_sub(pending);
        for _ in 0..pending {
            if let Some(slot) = self.slot(seq) {
                emit(&slot.load());
            }
            seq = seq.wrapping_add(1);
        }

        self.consumed.store(produced, Ordering::Release);
        if lost > 0 {
            self.lost.fetch_add(lost, Ordering::Relaxed);
        }

        DrainReport {
            delivered: pending,
            lost,
        }
    }

    /// Records a drain would deliver right now (capped at `N`).
    pub fn pending(&self) -> u32 {
        self.produced
            .load(Ordering::Acquire)
            .wrapping_sub(self.consumed.load(Ordering::Relaxed))
            .min(Self::CAPACITY)
    }

    /// Total records written (wrapping).
    pub fn produced(&self) -> u32 {
        self.produced.load(Ordering::Acquire)
    }

    /// Value of the produced counter at the last drain (wrapping).
    pub fn consumed(&self) -> u32 {
        self.consumed.load(Ordering::Relaxed)
    }

    /// Cumulative records lost to overwrite.
    pub fn lost(&self) -> u32 {
        self.lost.load(Ordering::Relaxed)
    }

    /// Slot the next producer will write.
    #[allow(clippy::arithmetic_side_effects)] // N >= 2 by SHAPE; modulo cannot fault
    pub fn write_cursor(&self) -> usize {
        self.claimed.load(Ordering::Relaxed) as usize % N
    }

    /// Slot the next drain starts from when no overwrite has occurred.
    #[allow(clippy::arithmetic_side_effects)] // N >= 2 by SHAPE; modulo cannot fault
    pub fn read_cursor(&self) -> usize {
        self.consumed.load(Ordering::Relaxed) as usize % N
    }

    /// Number of slots.
    pub const fn capacity(&self) -> usize {
        N
    }

    #[allow(clippy::arithmetic_side_effects)] // N >= 2 by SHAPE; modulo cannot fault
    fn slot(&self, seq: u32) -> Option<&Slot<CAP>> {
        self.slots.get(seq as usize % N)
    }
}

impl<const N: usize, const CAP: usize> Default for DiagnosticChannel<N, CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, const CAP: usize> fmt::Debug for DiagnosticChannel<N, CAP> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticChannel")
            .field("capacity", &N)
            .field("produced", &self.produced())
            .field("consumed", &self.consumed())
            .field("lost", &self.lost())
            .field("verbosity", &self.verbosity())
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::diag;

    fn collect<const N: usize, const CAP: usize>(
        channel: &DiagnosticChannel<N, CAP>,
    ) -> (Vec<(u8, String)>, DrainReport) {
        let mut out = Vec::new();
        let report = channel.drain(|r| out.push((r.level().get(), r.text().to_owned())));
        (out, report)
    }

    #[test]
    fn empty_drain_delivers_nothing() {
        let channel: DiagnosticChannel<2, 16> = DiagnosticChannel::new();
        let (out, report) = collect(&channel);
        assert!(out.is_empty());
        assert!(report.is_empty());
    }

    /// Three writes into a two-slot ring: the oldest is lost, the rest come
    /// out in write order.
    #[test]
    fn overflow_keeps_newest_in_order() {
        let channel: DiagnosticChannel<2, 16> = DiagnosticChannel::new();
        channel.set_verbosity(2);

        diag!(channel, Level::INFO, "A");
        diag!(channel, Level::VERBOSE, "B");
        diag!(channel, Level::INFO, "C");

        let (out, report) = collect(&channel);
        assert_eq!(out, vec![(2, "B".to_owned()), (1, "C".to_owned())]);
        assert_eq!(report, DrainReport { delivered: 2, lost: 1 });
        assert_eq!(channel.lost(), 1);
    }

    #[test]
    fn records_above_verbosity_are_dropped_without_side_effects() {
        let channel: DiagnosticChannel<2, 16> = DiagnosticChannel::new();
        channel.set_verbosity(1);
        let cursor = channel.write_cursor();

        diag!(channel, Level::VERBOSE, "noise {}", 1);

        assert_eq!(channel.produced(), 0);
        assert_eq!(channel.write_cursor(), cursor);
        assert_eq!(channel.pending(), 0);
    }

    #[test]
    fn second_drain_after_full_drain_is_empty() {
        let channel: DiagnosticChannel<4, 16> = DiagnosticChannel::new();
        diag!(channel, Level::ALWAYS, "one");
        diag!(channel, Level::ALWAYS, "two");

        let (first, _) = collect(&channel);
        let (second, report) = collect(&channel);
        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        assert!(report.is_empty());
        assert_eq!(channel.consumed(), channel.produced());
    }

    #[test]
    fn cursors_advance_modulo_capacity() {
        let channel: DiagnosticChannel<2, 16> = DiagnosticChannel::new();
        assert_eq!(channel.write_cursor(), 0);
        diag!(channel, Level::ALWAYS, "x");
        assert_eq!(channel.write_cursor(), 1);
        diag!(channel, Level::ALWAYS, "y");
        assert_eq!(channel.write_cursor(), 0);

        let _ = collect(&channel);
        assert_eq!(channel.read_cursor(), 0);
    }

    #[test]
    fn long_record_is_truncated_in_slot() {
        let channel: DiagnosticChannel<2, 8> = DiagnosticChannel::new();
        diag!(channel, Level::ALWAYS, "{}", "0123456789");
        let (out, _) = collect(&channel);
        assert_eq!(out[0].1, "01234567");
    }

    #[test]
    fn write_record_honours_verbosity() {
        let channel: DiagnosticChannel<2, 8> = DiagnosticChannel::new();
        channel.write_record(&DiagnosticRecord::new(Level::INFO, "quiet"));
        channel.write_record(&DiagnosticRecord::new(Level::ALWAYS, "loud"));
        let (out, _) = collect(&channel);
        assert_eq!(out, vec![(0, "loud".to_owned())]);
    }

    #[test]
    fn lost_accumulates_across_drains() {
        let channel: DiagnosticChannel<2, 8> = DiagnosticChannel::new();
        for _ in 0..5 {
            diag!(channel, Level::ALWAYS, "x");
        }
        let (_, first) = collect(&channel);
        for _ in 0..3 {
            diag!(channel, Level::ALWAYS, "y");
        }
        let (_, second) = collect(&channel);
        assert_eq!(first.lost, 3);
        assert_eq!(second.lost, 1);
        assert_eq!(channel.lost(), 4);
    }
}
