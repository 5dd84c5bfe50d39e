use std::cmp::Ordering;

use crate::time::SimTime;

/// Callback fired once when its event comes due.
pub type EventFn<C> = Box<dyn FnOnce(&mut C)>;

/// Pending event in the queue.
pub(super) struct Event<C> {
    pub(super) at: SimTime,
    pub(super) seq: u64,
    pub(super) label: &'static str,
    pub(super) callback: EventFn<C>,
}

impl<C> PartialEq for Event<C> {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl<C> Eq for Event<C> {}

impl<C> PartialOrd for Event<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C> Ord for Event<C> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behavior; ties broken by insertion order.
        other
            .at
            .cmp(&self.at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}
