use super::{AttackKind, AttackTable, Outcome, OutcomeLayers, OutcomePolicy};

/// Live, stat-derived inputs of one resolution, already converted to chances.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RollInputs {
    /// Hit chance from ratings and ability bonuses.
    pub hit: f64,
    /// Dodge/parry reduction from expertise.
    pub expertise: f64,
    /// Crit chance before suppression.
    pub crit: f64,
    /// Player defender's dodge, parry and block chances.
    pub defender_dodge: f64,
    pub defender_parry: f64,
    pub defender_block: f64,
}

/// Effective per-layer probabilities after clamping.
///
/// Layers are filled in priority order (miss, dodge, parry, glance, block,
/// crit); each takes at most what is left of the unit interval, so the sum
/// never exceeds one.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OutcomeChances {
    pub miss: f64,
    pub dodge: f64,
    pub parry: f64,
    pub glance: f64,
    pub block: f64,
    pub crit: f64,
}

impl OutcomeChances {
    pub fn compute(policy: &OutcomePolicy, table: &AttackTable, inputs: &RollInputs) -> Self {
        let layers = policy.layers;
        let enabled = |layer: OutcomeLayers, chance: f64| {
            if layers.contains(layer) {
                chance.max(0.0)
            } else {
                0.0
            }
        };

        let base_miss = match policy.kind {
            AttackKind::Melee | AttackKind::Ranged => table.base_melee_miss,
            AttackKind::Spell => table.base_spell_miss,
            AttackKind::Healing => 0.0,
        };
        let raw = [
            enabled(OutcomeLayers::MISS, base_miss - inputs.hit),
            enabled(
                OutcomeLayers::DODGE,
                table.base_dodge + inputs.defender_dodge - inputs.expertise,
            ),
            enabled(
                OutcomeLayers::PARRY,
                table.base_parry + inputs.defender_parry - inputs.expertise,
            ),
            enabled(OutcomeLayers::GLANCE, table.base_glance),
            enabled(OutcomeLayers::BLOCK, table.base_block + inputs.defender_block),
            enabled(OutcomeLayers::CRIT, inputs.crit - table.crit_suppression),
        ];

        let mut remaining = 1.0_f64;
        let mut clamped = [0.0; 6];
        for (slot, chance) in clamped.iter_mut().zip(raw) {
            *slot = chance.min(remaining);
            remaining -= *slot;
        }
        let [miss, dodge, parry, glance, block, crit] = clamped;
        Self {
            miss,
            dodge,
            parry,
            glance,
            block,
            crit,
        }
    }

    pub fn total(&self) -> f64 {
        self.miss + self.dodge + self.parry + self.glance + self.block + self.crit
    }

    /// Maps a uniform draw in `[0, 1)` to an outcome.
    pub fn classify(&self, roll: f64) -> Outcome {
        let ladder = [
            (self.miss, Outcome::Miss),
            (self.dodge, Outcome::Dodge),
            (self.parry, Outcome::Parry),
            (self.glance, Outcome::Glance),
            (self.block, Outcome::Block),
            (self.crit, Outcome::Crit),
        ];
        let mut cumulative = 0.0;
        for (chance, outcome) in ladder {
            cumulative += chance;
            if chance > 0.0 && roll < cumulative {
                return outcome;
            }
        }
        Outcome::Hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;

    fn boss_table() -> AttackTable {
        AttackTable::new(80, true, 83, false, &SimConfig::default())
    }

    #[test]
    fn white_table_fills_in_priority_order() {
        let inputs = RollInputs {
            hit: 0.08,
            expertise: 0.065,
            crit: 0.40,
            ..RollInputs::default()
        };
        let chances = OutcomeChances::compute(&OutcomePolicy::MELEE_WHITE, &boss_table(), &inputs);

        assert_eq!(chances.miss, 0.0);
        assert_eq!(chances.dodge, 0.0);
        assert!((chances.parry - 0.075).abs() < 1e-12);
        assert_eq!(chances.glance, 0.24);
        assert!((chances.crit - (0.40 - 0.048)).abs() < 1e-12);
    }

    #[test]
    fn crit_is_pushed_off_a_full_table() {
        let inputs = RollInputs {
            crit: 0.9,
            ..RollInputs::default()
        };
        let chances = OutcomeChances::compute(&OutcomePolicy::MELEE_WHITE, &boss_table(), &inputs);
        assert!((chances.total() - 1.0).abs() < 1e-12);
        assert_eq!(chances.classify(0.999_999), Outcome::Crit);
    }

    #[test]
    fn disabled_layers_never_appear() {
        let inputs = RollInputs {
            crit: 0.2,
            ..RollInputs::default()
        };
        let chances = OutcomeChances::compute(
            &OutcomePolicy::MELEE_SPECIAL_CRIT_ONLY,
            &boss_table(),
            &inputs,
        );
        assert_eq!(chances.miss + chances.dodge + chances.parry + chances.glance, 0.0);
        assert_eq!(chances.classify(0.0), Outcome::Crit);
        assert_eq!(chances.classify(0.5), Outcome::Hit);
    }

    #[test]
    fn empty_policy_always_hits() {
        let chances = OutcomeChances::compute(
            &OutcomePolicy::ALWAYS_HIT,
            &boss_table(),
            &RollInputs::default(),
        );
        assert_eq!(chances.total(), 0.0);
        assert_eq!(chances.classify(0.0), Outcome::Hit);
    }
}
