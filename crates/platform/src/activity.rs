//! The controlled periodic activity and its elapsed-time counter

use embassy_time::Duration;

/// The single activity the supervisory loop invokes once per cycle.
///
/// The mixer tick is the production implementation. It is expected to finish
/// well inside the cycle budget; when it does not, the bus watchdog catches
/// the overrun. The loop never inspects an outcome, so there is none to
/// return.
pub trait PeriodicActivity {
    /// Run one cycle of work.
    fn run_cycle(&mut self);
}

impl<A: PeriodicActivity + ?Sized> PeriodicActivity for &mut A {
    fn run_cycle(&mut self) {
        (**self).run_cycle();
    }
}

/// Performance counter fed with the activity's elapsed time every cycle.
pub trait PerfCounter {
    /// Record one event that took `elapsed`.
    fn record(&mut self, elapsed: Duration);
}

impl<P: PerfCounter + ?Sized> PerfCounter for &mut P {
    fn record(&mut self, elapsed: Duration) {
        (**self).record(elapsed);
    }
}

/// Elapsed-time counter: event count, last, worst case and running total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ElapsedPerf {
    name: &'static str,
    events: u32,
    last_us: u64,
    max_us: u64,
    total_us: u64,
}

impl ElapsedPerf {
    /// Create an empty counter.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            events: 0,
            last_us: 0,
            max_us: 0,
            total_us: 0,
        }
    }

    /// Counter name as shown in reports.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Events recorded so far (saturating).
    pub fn events(&self) -> u32 {
        self.events
    }

    /// Most recent elapsed time.
    pub fn last(&self) -> Duration {
        Duration::from_micros(self.last_us)
    }

    /// Worst elapsed time seen.
    pub fn max(&self) -> Duration {
        Duration::from_micros(self.max_us)
    }

    /// Mean elapsed time, or zero before the first event.
    pub fn mean(&self) -> Duration {
        match self.total_us.checked_div(u64::from(self.events)) {
            Some(us) => Duration::from_micros(us),
            None => Duration::from_micros(0),
        }
    }
}

impl PerfCounter for ElapsedPerf {
    fn record(&mut self, elapsed: Duration) {
        let us = elapsed.as_micros();
        self.events = self.events.saturating_add(1);
        self.last_us = us;
        self.max_us = self.max_us.max(us);
        self.total_us = self.total_us.saturating_add(us);
    }
}
