use strum::EnumCount;

use super::{Bonus, BonusSource, BonusStack, Multiplier, School, Stat, StatTarget};

/// Live stat sheet of one combatant.
///
/// Base values are set during setup and never change during a run; all run-time
/// changes go through tagged bonuses so they can be reverted exactly.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct UnitStats {
    base: Vec<f64>,
    stats: Vec<BonusStack>,
    multipliers: Vec<BonusStack>,
    school_dealt: Vec<BonusStack>,
    school_taken: Vec<BonusStack>,
}

impl UnitStats {
    pub fn new() -> Self {
        Self {
            base: vec![0.0; Stat::COUNT],
            stats: vec![BonusStack::new(); Stat::COUNT],
            multipliers: vec![BonusStack::new(); Multiplier::COUNT],
            school_dealt: vec![BonusStack::new(); School::COUNT],
            school_taken: vec![BonusStack::new(); School::COUNT],
        }
    }

    /// Builder-style base value assignment.
    #[must_use]
    pub fn with(mut self, stat: Stat, value: f64) -> Self {
        self.set_base(stat, value);
        self
    }

    pub fn set_base(&mut self, stat: Stat, value: f64) {
        self.base[stat as usize] = value;
    }

    pub fn base(&self, stat: Stat) -> f64 {
        self.base[stat as usize]
    }

    /// Current value of `stat` with every active bonus applied.
    pub fn stat(&self, stat: Stat) -> f64 {
        self.stats[stat as usize].apply(self.base[stat as usize])
    }

    pub fn multiplier(&self, multiplier: Multiplier) -> f64 {
        self.multipliers[multiplier as usize].apply(1.0)
    }

    pub fn school_dealt(&self, school: School) -> f64 {
        self.school_dealt[school as usize].apply(1.0)
    }

    pub fn school_taken(&self, school: School) -> f64 {
        self.school_taken[school as usize].apply(1.0)
    }

    fn stack_mut(&mut self, target: StatTarget) -> &mut BonusStack {
        match target {
            StatTarget::Stat(s) => &mut self.stats[s as usize],
            StatTarget::Multiplier(m) => &mut self.multipliers[m as usize],
            StatTarget::SchoolDealt(s) => &mut self.school_dealt[s as usize],
            StatTarget::SchoolTaken(s) => &mut self.school_taken[s as usize],
        }
    }

    pub fn add_bonus(&mut self, target: impl Into<StatTarget>, source: BonusSource, bonus: Bonus) {
        self.stack_mut(target.into()).add(source, bonus);
    }

    /// Removes every bonus `source` added anywhere on the sheet.
    pub fn remove_source(&mut self, source: BonusSource) -> usize {
        self.stacks_mut().map(|stack| stack.remove_source(source)).sum()
    }

    /// Number of bonuses currently contributed by auras across the sheet.
    pub fn aura_entries(&self) -> usize {
        self.stacks().map(BonusStack::aura_entries).sum()
    }

    fn stacks(&self) -> impl Iterator<Item = &BonusStack> {
        self.stats
            .iter()
            .chain(&self.multipliers)
            .chain(&self.school_dealt)
            .chain(&self.school_taken)
    }

    fn stacks_mut(&mut self) -> impl Iterator<Item = &mut BonusStack> {
        self.stats
            .iter_mut()
            .chain(&mut self.multipliers)
            .chain(&mut self.school_dealt)
            .chain(&mut self.school_taken)
    }
}

impl Default for UnitStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{AuraId, UnitId};

    #[test]
    fn multipliers_default_to_one() {
        let stats = UnitStats::new();
        assert_eq!(stats.multiplier(Multiplier::DamageDealt), 1.0);
        assert_eq!(stats.school_taken(School::Fire), 1.0);
    }

    #[test]
    fn bonuses_target_independent_slots() {
        let aura = BonusSource::Aura(AuraId::new(UnitId(1), 0));
        let mut stats = UnitStats::new().with(Stat::AttackPower, 1000.0);

        stats.add_bonus(Stat::AttackPower, aura, Bonus::flat(250.0));
        stats.add_bonus(StatTarget::SchoolTaken(School::Shadow), aura, Bonus::more(1.13));

        assert_eq!(stats.stat(Stat::AttackPower), 1250.0);
        assert!((stats.school_taken(School::Shadow) - 1.13).abs() < 1e-12);
        assert_eq!(stats.school_taken(School::Fire), 1.0);

        assert_eq!(stats.remove_source(aura), 2);
        assert_eq!(stats.stat(Stat::AttackPower), 1000.0);
        assert_eq!(stats.aura_entries(), 0);
    }
}
