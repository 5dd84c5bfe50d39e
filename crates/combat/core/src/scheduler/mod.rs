//! Discrete-event clock.
//!
//! Events are one-shot callbacks keyed by `(fire_time, insertion_sequence)`.
//! They fire in non-decreasing time order and FIFO among ties, each exactly
//! once. A callback may schedule further events, including at the current
//! time; those run after every already-queued event with the same time.
//!
//! Cancellation is cooperative: [`Scheduler::schedule_guarded`] captures a
//! liveness predicate that is evaluated at fire time, and the callback is
//! skipped when it no longer holds (a refreshed aura, a rolled-over dot).
//!
//! The scheduler is generic over the context it mutates so the ordering rules
//! can be exercised without a full simulation.

mod queue;

use std::collections::BinaryHeap;
use std::time::Duration;

pub use queue::EventFn;
use queue::Event;

use crate::time::SimTime;

/// Contexts that own a scheduler and can be driven by [`advance`].
pub trait HasScheduler: Sized + 'static {
    fn scheduler(&self) -> &Scheduler<Self>;
    fn scheduler_mut(&mut self) -> &mut Scheduler<Self>;
}

/// Counters describing scheduler activity since the last [`Scheduler::clear`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedulerStats {
    pub scheduled: u64,
    pub fired: u64,
    /// Guarded events whose liveness check failed at fire time.
    pub cancelled: u64,
}

/// Min-priority queue of pending events plus the current time.
pub struct Scheduler<C> {
    now: SimTime,
    next_seq: u64,
    queue: BinaryHeap<Event<C>>,
    stats: SchedulerStats,
}

impl<C: 'static> Scheduler<C> {
    pub fn new() -> Self {
        Self {
            now: SimTime::ZERO,
            next_seq: 0,
            queue: BinaryHeap::new(),
            stats: SchedulerStats::default(),
        }
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Fire time of the next pending event.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.queue.peek().map(|event| event.at)
    }

    /// Enqueues `callback` to run at `at`.
    ///
    /// # Panics
    ///
    /// Panics if `at` is earlier than the current time.
    pub fn schedule(
        &mut self,
        at: SimTime,
        label: &'static str,
        callback: impl FnOnce(&mut C) + 'static,
    ) {
        assert!(
            at >= self.now,
            "event {label:?} scheduled at {at}, before current time {}",
            self.now
        );
        let seq = self.next_seq;
        self.next_seq += 1;
        self.stats.scheduled += 1;
        tracing::trace!(time = %at, seq, label, "event scheduled");
        self.queue.push(Event {
            at,
            seq,
            label,
            callback: Box::new(callback),
        });
    }

    /// Enqueues `callback` `delay` after the current time.
    pub fn schedule_in(
        &mut self,
        delay: Duration,
        label: &'static str,
        callback: impl FnOnce(&mut C) + 'static,
    ) {
        let at = self.now + delay;
        self.schedule(at, label, callback);
    }

    /// Removes the next event if it is due at or before `horizon`, advancing
    /// the clock to its fire time.
    fn pop_due(&mut self, horizon: SimTime) -> Option<Event<C>> {
        if self.queue.peek()?.at > horizon {
            return None;
        }
        let event = self.queue.pop()?;
        self.now = event.at;
        self.stats.fired += 1;
        Some(event)
    }

    /// Drops every pending event and rewinds the clock to zero.
    ///
    /// Sequence numbers keep increasing so FIFO order is never ambiguous.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.now = SimTime::ZERO;
        self.stats = SchedulerStats::default();
    }
}

impl<C: HasScheduler> Scheduler<C> {
    /// Like [`schedule`](Self::schedule), but the callback only runs if
    /// `is_live` still holds when the event fires.
    pub fn schedule_guarded(
        &mut self,
        at: SimTime,
        label: &'static str,
        is_live: impl Fn(&C) -> bool + 'static,
        callback: impl FnOnce(&mut C) + 'static,
    ) {
        self.schedule(at, label, move |ctx: &mut C| {
            if is_live(ctx) {
                callback(ctx);
            } else {
                ctx.scheduler_mut().stats.cancelled += 1;
                tracing::trace!(label, "stale event skipped");
            }
        });
    }
}

impl<C: 'static> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for Scheduler<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now)
            .field("pending", &self.queue.len())
            .field("stats", &self.stats)
            .finish()
    }
}

/// Fires due events in order until the queue is empty or the next event lies
/// past `horizon`. Returns the number of events fired.
///
/// On return the clock reads `horizon`, so drivers can step through idle
/// time. Draining with `SimTime::NEVER` leaves it at the last fire time.
pub fn advance<C: HasScheduler>(ctx: &mut C, horizon: SimTime) -> usize {
    let mut fired = 0;
    while let Some(event) = ctx.scheduler_mut().pop_due(horizon) {
        tracing::trace!(time = %event.at, seq = event.seq, label = event.label, "event fired");
        (event.callback)(ctx);
        fired += 1;
    }
    let scheduler = ctx.scheduler_mut();
    if !horizon.is_never() && scheduler.now < horizon {
        scheduler.now = horizon;
    }
    fired
}
