use crate::ids::ActionId;

/// Accumulated flow for one source and direction.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlowTotals {
    pub events: u64,
    pub requested: f64,
    pub realized: f64,
}

impl FlowTotals {
    fn record(&mut self, requested: f64, realized: f64) {
        self.events += 1;
        self.requested += requested;
        self.realized += realized;
    }

    fn absorb(&mut self, other: &FlowTotals) {
        self.events += other.events;
        self.requested += other.requested;
        self.realized += other.realized;
    }

    /// Amount lost to clamping.
    pub fn wasted(&self) -> f64 {
        self.requested - self.realized
    }
}

/// Per-iteration and cumulative flow of one source.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceFlow {
    pub current: FlowTotals,
    pub cumulative: FlowTotals,
}

/// Gains and spends of one pool, keyed by source.
///
/// Sources are few per pool, so lookups scan a small vector.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceLedger {
    gains: Vec<(ActionId, SourceFlow)>,
    spends: Vec<(ActionId, SourceFlow)>,
}

fn entry(table: &mut Vec<(ActionId, SourceFlow)>, source: ActionId) -> &mut SourceFlow {
    let index = match table.iter().position(|(s, _)| *s == source) {
        Some(index) => index,
        None => {
            table.push((source, SourceFlow::default()));
            table.len() - 1
        }
    };
    &mut table[index].1
}

impl ResourceLedger {
    pub(super) fn record_gain(&mut self, source: ActionId, requested: f64, realized: f64) {
        entry(&mut self.gains, source).current.record(requested, realized);
    }

    pub(super) fn record_spend(&mut self, source: ActionId, requested: f64, realized: f64) {
        entry(&mut self.spends, source).current.record(requested, realized);
    }

    pub fn gains(&self) -> impl Iterator<Item = (ActionId, &SourceFlow)> {
        self.gains.iter().map(|(s, f)| (*s, f))
    }

    pub fn spends(&self) -> impl Iterator<Item = (ActionId, &SourceFlow)> {
        self.spends.iter().map(|(s, f)| (*s, f))
    }

    pub fn gain_from(&self, source: ActionId) -> Option<&SourceFlow> {
        self.gains.iter().find(|(s, _)| *s == source).map(|(_, f)| f)
    }

    pub fn spend_from(&self, source: ActionId) -> Option<&SourceFlow> {
        self.spends.iter().find(|(s, _)| *s == source).map(|(_, f)| f)
    }

    /// Realized gain this iteration across all sources.
    pub fn total_gained(&self) -> f64 {
        self.gains.iter().map(|(_, f)| f.current.realized).sum()
    }

    /// Realized spend this iteration across all sources.
    pub fn total_spent(&self) -> f64 {
        self.spends.iter().map(|(_, f)| f.current.realized).sum()
    }

    /// Drops this iteration's flow without folding it.
    pub(super) fn discard_iteration(&mut self) {
        for (_, flow) in self.gains.iter_mut().chain(self.spends.iter_mut()) {
            flow.current = FlowTotals::default();
        }
    }

    pub(super) fn done_iteration(&mut self) {
        for (_, flow) in self.gains.iter_mut().chain(self.spends.iter_mut()) {
            let current = std::mem::take(&mut flow.current);
            flow.cumulative.absorb(&current);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn done_iteration_moves_current_into_cumulative() {
        let source = ActionId::spell(5);
        let mut ledger = ResourceLedger::default();
        ledger.record_gain(source, 10.0, 8.0);
        ledger.record_gain(source, 5.0, 5.0);
        ledger.done_iteration();
        ledger.record_gain(source, 1.0, 1.0);

        let flow = ledger.gain_from(source).unwrap();
        assert_eq!(flow.current.events, 1);
        assert_eq!(flow.cumulative.events, 2);
        assert_eq!(flow.cumulative.realized, 13.0);
        assert_eq!(flow.cumulative.wasted(), 2.0);
        assert_eq!(ledger.total_gained(), 1.0);
    }

    #[test]
    fn discarded_flow_never_reaches_cumulative() {
        let source = ActionId::spell(5);
        let mut ledger = ResourceLedger::default();
        ledger.record_spend(source, 30.0, 30.0);
        ledger.discard_iteration();
        ledger.done_iteration();

        let flow = ledger.spend_from(source).unwrap();
        assert_eq!(flow.cumulative.events, 0);
        assert_eq!(ledger.total_spent(), 0.0);
    }
}
