use super::{Regeneration, ResourceKind};
use crate::ids::{ActionId, OtherAction, UnitId};
use crate::sim::Simulation;

impl Simulation {
    /// Schedules the first regeneration tick of every pool that regenerates.
    pub(crate) fn start_regeneration(&mut self) {
        let regenerating: Vec<(UnitId, ResourceKind, Regeneration)> = self
            .units()
            .iter()
            .flat_map(|unit| {
                unit.pools()
                    .filter_map(move |pool| pool.regen().map(|regen| (unit.id(), pool.kind(), regen)))
            })
            .filter(|(_, _, regen)| regen.amount > 0.0 && !regen.interval.is_zero())
            .collect();

        for (unit, kind, regen) in regenerating {
            self.schedule_regen_tick(unit, kind, regen);
        }
    }

    fn schedule_regen_tick(&mut self, unit: UnitId, kind: ResourceKind, regen: Regeneration) {
        self.schedule_in(regen.interval, "regen tick", move |sim| {
            if let Err(err) = sim.gain_resource(unit, kind, regen.amount, ActionId::other(OtherAction::Regen)) {
                tracing::warn!(%unit, %kind, %err, "regeneration tick failed");
                return;
            }
            sim.schedule_regen_tick(unit, kind, regen);
        });
    }
}
