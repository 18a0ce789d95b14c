//! Deadline timer: one-shot and periodic callouts on a dispatch context
//!
//! A fixed table of `N` entries, each addressed by a [`TimerHandle`] handed
//! out once by [`DeadlineTimer::allocate`]. An entry holds at most one pending
//! deadline; arming an armed handle replaces its deadline under the table
//! lock, so dispatch sees either the old entry or the new one, never a mix.
//!
//! Dispatch runs on its own context (an interrupt executor on hardware, a
//! dedicated thread on the host). Callouts are fired *outside* the table lock
//! and must obey interrupt-context rules: no blocking, bounded time.
//!
//! # Re-arming from a callout
//!
//! A callout does not call back into the timer. It returns a [`Rearm`] and
//! the dispatcher applies it after the callout returns. Because that write
//! lands after anything the main context did while the callout ran, a
//! callout's re-arm always wins a race with a concurrent `arm_after`.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use platform::{Duration, Instant, MonotonicClock};
use thiserror_no_std::Error;

/// Opaque reference to one timer table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerHandle(u8);

impl TimerHandle {
    fn index(self) -> usize {
        usize::from(self.0)
    }
}

/// What the dispatcher does with an entry after its callout returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rearm {
    /// Leave the entry as dispatch left it: periodic entries are already
    /// re-armed for `now + period`, one-shot entries are disarmed.
    Keep,
    /// Re-arm as a one-shot at `now + delay`, replacing whatever is pending.
    After(Duration),
}

/// Work fired by the deadline timer.
///
/// `fire` runs on the dispatch context. The implementor carries whatever
/// argument the callout needs.
pub trait Callout: Sync {
    /// Called once per due deadline with the dispatch time.
    fn fire(&self, now: Instant) -> Rearm;
}

/// Errors from [`DeadlineTimer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerError {
    /// Every handle slot has already been allocated.
    #[error("deadline timer has no free handles")]
    Exhausted,
}

/// Arming surface shared by the main context and callouts' owners.
///
/// Implemented by [`DeadlineTimer`]; components that only arm and cancel
/// (the bus watchdog, the boot sequence) hold a `&dyn Scheduler` so they do
/// not carry the timer's clock and size parameters.
pub trait Scheduler<'a>: Sync {
    /// Fire `callout` once at `now + delay`, replacing any pending deadline.
    fn arm_after(&self, handle: TimerHandle, delay: Duration, callout: &'a dyn Callout);

    /// Fire `callout` at `now + initial`, then every `period` after each fire.
    ///
    /// A zero `period` arms a one-shot.
    fn arm_every(
        &self,
        handle: TimerHandle,
        initial: Duration,
        period: Duration,
        callout: &'a dyn Callout,
    );

    /// Drop the pending deadline for `handle`, if any.
    fn cancel(&self, handle: TimerHandle);

    /// `true` while `handle` has a pending deadline.
    fn is_armed(&self, handle: TimerHandle) -> bool;
}

#[derive(Clone, Copy)]
struct Entry<'a> {
    deadline: Instant,
    period: Option<Duration>,
    callout: &'a dyn Callout,
}

struct Table<'a, const N: usize> {
    entries: [Option<Entry<'a>>; N],
    allocated: usize,
}

impl<'a, const N: usize> Table<'a, N> {
    /// Earliest entry with `deadline <= now`. Periodic entries are re-armed
    /// before the callout runs; one-shot entries are removed.
    fn take_due(&mut self, now: Instant) -> Option<(usize, &'a dyn Callout)> {
        let (index, _) = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.map(|e| (i, e.deadline)))
            .filter(|&(_, deadline)| deadline <= now)
            .min_by_key(|&(_, deadline)| deadline)?;

        let slot = self.entries.get_mut(index)?;
        let entry = (*slot)?;
        *slot = entry.period.map(|period| Entry {
            deadline: after(now, period),
            ..entry
        });
        Some((index, entry.callout))
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().flatten().map(|e| e.deadline).min()
    }
}

/// `now + delay`, saturating at the end of time.
fn after(now: Instant, delay: Duration) -> Instant {
    now.checked_add(delay).unwrap_or(Instant::MAX)
}

/// Table-driven deadline timer over a [`MonotonicClock`].
pub struct DeadlineTimer<'a, C: MonotonicClock, const N: usize> {
    clock: C,
    table: Mutex<CriticalSectionRawMutex, RefCell<Table<'a, N>>>,
    /// Raised whenever the table changes so the dispatcher re-evaluates its
    /// next wake time.
    changed: Signal<CriticalSectionRawMutex, ()>,
}

impl<'a, C: MonotonicClock, const N: usize> DeadlineTimer<'a, C, N> {
    /// Empty timer; `const` so it can live in a `static`.
    pub const fn new(clock: C) -> Self {
        Self {
            clock,
            table: Mutex::new(RefCell::new(Table {
                entries: [None; N],
                allocated: 0,
            })),
            changed: Signal::new(),
        }
    }

    /// Reserve a handle. Handles are never returned to the pool.
    pub fn allocate(&self) -> Result<TimerHandle, TimerError> {
        self.table.lock(|table| {
            let mut table = table.borrow_mut();
            let index = table.allocated;
            if index >= N {
                return Err(TimerError::Exhausted);
            }
            let raw = u8::try_from(index).map_err(|_| TimerError::Exhausted)?;
            table.allocated = index.saturating_add(1);
            Ok(TimerHandle(raw))
        })
    }

    /// Current time on the timer's clock.
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Earliest pending deadline across all handles.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.table.lock(|table| table.borrow().next_deadline())
    }

    /// Fire every callout whose deadline has passed, earliest first.
    ///
    /// Returns the next pending deadline, if any. Safe to call at any time
    /// from the dispatch context; host tests call it directly while stepping
    /// a mock clock.
    pub fn dispatch(&self) -> Option<Instant> {
        loop {
            let now = self.clock.now();
            let due = self.table.lock(|table| table.borrow_mut().take_due(now));
            let Some((index, callout)) = due else {
                break;
            };

            if let Rearm::After(delay) = callout.fire(now) {
                self.store(index, Some(Entry {
                    deadline: after(now, delay),
                    period: None,
                    callout,
                }));
            }
        }
        self.next_deadline()
    }

    fn store(&self, index: usize, entry: Option<Entry<'a>>) {
        self.table.lock(|table| {
            if let Some(slot) = table.borrow_mut().entries.get_mut(index) {
                *slot = entry;
            }
        });
        self.changed.signal(());
    }
}

impl<'a, const N: usize> DeadlineTimer<'a, platform::SystemClock, N> {
    /// Dispatcher task: sleep until the next deadline or a table change,
    /// then dispatch.
    ///
    /// Spawn this on the highest-priority executor; callouts run inside it.
    pub async fn run(&self) -> ! {
        use embassy_futures::select::select;
        use embassy_time::Timer;

        loop {
            match self.dispatch() {
                Some(at) => {
                    select(Timer::at(at), self.changed.wait()).await;
                }
                None => self.changed.wait().await,
            }
        }
    }
}

impl<'a, C: MonotonicClock, const N: usize> Scheduler<'a> for DeadlineTimer<'a, C, N> {
    fn arm_after(&self, handle: TimerHandle, delay: Duration, callout: &'a dyn Callout) {
        self.store(
            handle.index(),
            Some(Entry {
                deadline: after(self.clock.now(), delay),
                period: None,
                callout,
            }),
        );
    }

    fn arm_every(
        &self,
        handle: TimerHandle,
        initial: Duration,
        period: Duration,
        callout: &'a dyn Callout,
    ) {
        self.store(
            handle.index(),
            Some(Entry {
                deadline: after(self.clock.now(), initial),
                period: (period.as_ticks() > 0).then_some(period),
                callout,
            }),
        );
    }

    fn cancel(&self, handle: TimerHandle) {
        self.store(handle.index(), None);
    }

    fn is_armed(&self, handle: TimerHandle) -> bool {
        self.table.lock(|table| {
            table
                .borrow()
                .entries
                .get(handle.index())
                .is_some_and(Option::is_some)
        })
    }
}

impl<C: MonotonicClock, const N: usize> core::fmt::Debug for DeadlineTimer<'_, C, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DeadlineTimer")
            .field("capacity", &N)
            .field("next_deadline", &self.next_deadline())
            .finish_non_exhaustive()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
