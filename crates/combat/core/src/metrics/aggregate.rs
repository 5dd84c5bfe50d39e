use std::collections::BTreeMap;

use super::SpellMetrics;
use crate::ids::{ActionId, SpellId, UnitId};
use crate::resource::ResourceKind;

/// Streaming mean / variance (Welford), mergeable across workers.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunningStat {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningStat {
    /// A sample of `count` zeros.
    pub const fn zeros(count: u64) -> Self {
        Self {
            count,
            mean: 0.0,
            m2: 0.0,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// Combines two independent samples (Chan et al.).
    pub fn merge(&mut self, other: &RunningStat) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        let count = self.count + other.count;
        let delta = other.mean - self.mean;
        let weight = other.count as f64 / count as f64;
        self.mean += delta * weight;
        self.m2 += other.m2 + delta * delta * self.count as f64 * weight;
        self.count = count;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population standard deviation; zero below two samples.
    pub fn stdev(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / self.count as f64).sqrt()
        }
    }
}

/// Across-iteration summary of one (ability, target) pair.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellSummary {
    pub damage: RunningStat,
    pub healing: RunningStat,
    pub threat: RunningStat,
    pub casts: RunningStat,
    /// Outcome counters summed over all iterations.
    pub totals: SpellMetrics,
}

impl SpellSummary {
    fn push(&mut self, metrics: &SpellMetrics) {
        self.damage.push(metrics.total_damage);
        self.healing.push(metrics.total_healing);
        self.threat.push(metrics.total_threat);
        self.casts.push(metrics.casts as f64);
        self.push_totals(metrics);
    }

    fn merge(&mut self, other: &SpellSummary) {
        self.damage.merge(&other.damage);
        self.healing.merge(&other.healing);
        self.threat.merge(&other.threat);
        self.casts.merge(&other.casts);
        self.push_totals(&other.totals);
    }

    fn push_totals(&mut self, other: &SpellMetrics) {
        let t = &mut self.totals;
        t.casts += other.casts;
        t.hits += other.hits;
        t.crits += other.crits;
        t.misses += other.misses;
        t.dodges += other.dodges;
        t.parries += other.parries;
        t.blocks += other.blocks;
        t.glances += other.glances;
        t.partial_resists += other.partial_resists;
        t.ticks += other.ticks;
        t.crit_ticks += other.crit_ticks;
        t.total_damage += other.total_damage;
        t.total_healing += other.total_healing;
        t.total_threat += other.total_threat;
        t.total_crit_damage += other.total_crit_damage;
    }
}

/// Across-iteration flow of one resource source on one combatant.
///
/// Iterations in which the source moved nothing count as zeros.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceSummary {
    pub gained: RunningStat,
    pub spent: RunningStat,
    /// Threat generated by the gains.
    pub threat: RunningStat,
}

impl ResourceSummary {
    fn zeros(count: u64) -> Self {
        Self {
            gained: RunningStat::zeros(count),
            spent: RunningStat::zeros(count),
            threat: RunningStat::zeros(count),
        }
    }

    fn merge(&mut self, other: &ResourceSummary) {
        self.gained.merge(&other.gained);
        self.spent.merge(&other.spent);
        self.threat.merge(&other.threat);
    }
}

/// Flow of one resource source within one iteration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct ResourceIteration {
    pub gained: f64,
    pub spent: f64,
    pub threat: f64,
}

/// Key of a [`ResourceSummary`]: owner, pool and source.
pub type ResourceKey = (UnitId, ResourceKind, ActionId);

/// Across-iteration summary of one combatant.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitSummary {
    pub damage: RunningStat,
    pub dps: RunningStat,
    pub healing: RunningStat,
    pub threat: RunningStat,
}

/// Encounter-wide totals.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncounterSummary {
    /// Damage taken by all enemies per iteration.
    pub damage_taken: RunningStat,
}

/// Metrics of every finished iteration.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AggregateMetrics {
    iterations: u64,
    spells: BTreeMap<(SpellId, UnitId), SpellSummary>,
    units: BTreeMap<UnitId, UnitSummary>,
    resources: BTreeMap<ResourceKey, ResourceSummary>,
    encounter: EncounterSummary,
}

/// Per-unit totals of one iteration, collected before folding.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct UnitIteration {
    pub damage: f64,
    pub healing: f64,
    pub threat: f64,
}

impl AggregateMetrics {
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn spell(&self, spell: SpellId, target: UnitId) -> Option<&SpellSummary> {
        self.spells.get(&(spell, target))
    }

    pub fn spells(&self) -> impl Iterator<Item = (&(SpellId, UnitId), &SpellSummary)> {
        self.spells.iter()
    }

    pub fn unit(&self, unit: UnitId) -> Option<&UnitSummary> {
        self.units.get(&unit)
    }

    /// Flow of `kind` on `unit` attributed to `source`.
    pub fn resource(&self, unit: UnitId, kind: ResourceKind, source: ActionId) -> Option<&ResourceSummary> {
        self.resources.get(&(unit, kind, source))
    }

    pub fn resources(&self) -> impl Iterator<Item = (&ResourceKey, &ResourceSummary)> {
        self.resources.iter()
    }

    pub fn encounter(&self) -> &EncounterSummary {
        &self.encounter
    }

    pub(crate) fn push_spell(&mut self, spell: SpellId, target: UnitId, metrics: &SpellMetrics) {
        self.spells.entry((spell, target)).or_default().push(metrics);
    }

    pub(crate) fn push_unit(&mut self, unit: UnitId, totals: UnitIteration, seconds: f64) {
        let summary = self.units.entry(unit).or_default();
        summary.damage.push(totals.damage);
        summary.dps.push(if seconds > 0.0 {
            totals.damage / seconds
        } else {
            0.0
        });
        summary.healing.push(totals.healing);
        summary.threat.push(totals.threat);
    }

    /// Records one source's flow for the running iteration. A source first
    /// seen now counts as zero for every earlier iteration.
    pub(crate) fn push_resource(&mut self, key: ResourceKey, flow: ResourceIteration) {
        let earlier = self.iterations;
        let summary = self
            .resources
            .entry(key)
            .or_insert_with(|| ResourceSummary::zeros(earlier));
        summary.gained.push(flow.gained);
        summary.spent.push(flow.spent);
        summary.threat.push(flow.threat);
    }

    pub(crate) fn finish_iteration(&mut self, encounter_damage: f64) {
        self.encounter.damage_taken.push(encounter_damage);
        self.iterations += 1;
    }

    /// Combines results of independent runs.
    pub fn merge(&mut self, other: &AggregateMetrics) {
        // Sources seen by only one side count as zeros on the other.
        for (key, summary) in &mut self.resources {
            if !other.resources.contains_key(key) {
                summary.merge(&ResourceSummary::zeros(other.iterations));
            }
        }
        let earlier = self.iterations;
        for (key, summary) in &other.resources {
            let mine = self
                .resources
                .entry(*key)
                .or_insert_with(|| ResourceSummary::zeros(earlier));
            mine.merge(summary);
        }
        self.iterations += other.iterations;
        for (key, summary) in &other.spells {
            self.spells.entry(*key).or_default().merge(summary);
        }
        for (unit, summary) in &other.units {
            let mine = self.units.entry(*unit).or_default();
            mine.damage.merge(&summary.damage);
            mine.dps.merge(&summary.dps);
            mine.healing.merge(&summary.healing);
            mine.threat.merge(&summary.threat);
        }
        self.encounter.damage_taken.merge(&other.encounter.damage_taken);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_stat_matches_direct_computation() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let mut stat = RunningStat::default();
        values.iter().for_each(|v| stat.push(*v));

        assert_eq!(stat.count(), 8);
        assert!((stat.mean() - 5.0).abs() < 1e-12);
        assert!((stat.stdev() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn merged_stats_equal_sequential_stats() {
        let values = [1.0, 3.0, 8.0, 13.0, 21.0, 34.0];
        let mut all = RunningStat::default();
        let mut left = RunningStat::default();
        let mut right = RunningStat::default();
        for (i, v) in values.iter().enumerate() {
            all.push(*v);
            if i < 2 {
                left.push(*v);
            } else {
                right.push(*v);
            }
        }
        left.merge(&right);

        assert_eq!(left.count(), all.count());
        assert!((left.mean() - all.mean()).abs() < 1e-9);
        assert!((left.stdev() - all.stdev()).abs() < 1e-9);
    }

    fn flow(gained: f64, spent: f64) -> ResourceIteration {
        ResourceIteration {
            gained,
            spent,
            threat: gained * 5.0,
        }
    }

    #[test]
    fn late_resource_sources_are_padded_with_zeros() {
        let key = (UnitId(0), ResourceKind::Rage, ActionId::spell(23922));
        let mut metrics = AggregateMetrics::default();
        metrics.finish_iteration(0.0);
        metrics.push_resource(key, flow(10.0, 0.0));
        metrics.finish_iteration(0.0);

        let summary = metrics.resource(key.0, key.1, key.2).unwrap();
        assert_eq!(summary.gained.count(), 2);
        assert!((summary.gained.mean() - 5.0).abs() < 1e-12);
        assert!((summary.threat.mean() - 25.0).abs() < 1e-12);
    }

    #[test]
    fn merged_resources_match_a_single_run() {
        let rage = (UnitId(0), ResourceKind::Rage, ActionId::spell(23922));
        let mana = (UnitId(1), ResourceKind::Mana, ActionId::spell(48461));

        let mut single = AggregateMetrics::default();
        single.push_resource(rage, flow(10.0, 0.0));
        single.finish_iteration(0.0);
        single.push_resource(rage, flow(20.0, 5.0));
        single.finish_iteration(0.0);
        single.push_resource(mana, flow(0.0, 300.0));
        single.finish_iteration(0.0);

        let mut left = AggregateMetrics::default();
        left.push_resource(rage, flow(10.0, 0.0));
        left.finish_iteration(0.0);
        left.push_resource(rage, flow(20.0, 5.0));
        left.finish_iteration(0.0);
        let mut right = AggregateMetrics::default();
        right.push_resource(mana, flow(0.0, 300.0));
        right.finish_iteration(0.0);
        left.merge(&right);

        for key in [rage, mana] {
            let merged = left.resource(key.0, key.1, key.2).unwrap();
            let expected = single.resource(key.0, key.1, key.2).unwrap();
            assert_eq!(merged.gained.count(), 3);
            assert!((merged.gained.mean() - expected.gained.mean()).abs() < 1e-9);
            assert!((merged.spent.mean() - expected.spent.mean()).abs() < 1e-9);
            assert!((merged.spent.stdev() - expected.spent.stdev()).abs() < 1e-9);
            assert!((merged.threat.mean() - expected.threat.mean()).abs() < 1e-9);
        }
    }
}
