//! Attack tables and mitigation curves.

use crate::config::{LevelTable, SimConfig};

/// Level-derived chances for one attacker→defender pair.
///
/// Built once per pair when the simulation is finalized. Stat-driven parts
/// (hit, expertise, crit, a player defender's dodge/parry/block, armor,
/// resistances) are read live at resolution time and combined in
/// [`OutcomeChances`](super::OutcomeChances).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackTable {
    pub base_melee_miss: f64,
    pub base_spell_miss: f64,
    pub base_dodge: f64,
    pub base_parry: f64,
    pub base_block: f64,
    pub base_glance: f64,
    pub glance_multiplier: f64,
    pub crit_suppression: f64,
    /// Whether the defender's own dodge/parry/block stats join the table.
    pub defender_is_player: bool,
    /// Level of the attacker, used for the resistance curve.
    pub attacker_level: u32,
}

impl AttackTable {
    /// Builds the table from the level differential.
    ///
    /// Player defenders get level-neutral base avoidance plus their own stats;
    /// non-player defenders use the level table rows and cannot be glanced
    /// against by non-players.
    pub fn new(
        attacker_level: u32,
        attacker_is_player: bool,
        defender_level: u32,
        defender_is_player: bool,
        config: &SimConfig,
    ) -> Self {
        let levels: &LevelTable = &config.levels;
        let diff = defender_level as i32 - attacker_level as i32;
        let row = LevelTable::row(diff);

        if defender_is_player {
            Self {
                base_melee_miss: levels.melee_miss[row],
                base_spell_miss: levels.spell_miss[row],
                base_dodge: 0.0,
                base_parry: 0.0,
                base_block: 0.0,
                base_glance: 0.0,
                glance_multiplier: levels.glance_multiplier,
                crit_suppression: 0.0,
                defender_is_player,
                attacker_level,
            }
        } else {
            Self {
                base_melee_miss: levels.melee_miss[row],
                base_spell_miss: levels.spell_miss[row],
                base_dodge: levels.dodge[row],
                base_parry: levels.parry[row],
                base_block: levels.block,
                base_glance: if attacker_is_player {
                    levels.glance[row]
                } else {
                    0.0
                },
                glance_multiplier: levels.glance_multiplier,
                crit_suppression: levels.crit_suppression[row],
                defender_is_player,
                attacker_level,
            }
        }
    }
}

/// Damage multiplier after armor.
///
/// # Formula
/// ```text
/// 1 - min(cap, armor / (armor + K))
/// ```
pub fn armor_damage_modifier(armor: f64, constant: f64, cap: f64) -> f64 {
    let armor = armor.max(0.0);
    1.0 - (armor / (armor + constant)).min(cap)
}

/// Average fraction of a magic hit resisted.
///
/// # Formula
/// ```text
/// min(0.75, resistance / (attacker_level × per_level))
/// ```
pub fn average_resist(resistance: f64, attacker_level: u32, per_level: f64) -> f64 {
    let scale = f64::from(attacker_level.max(1)) * per_level;
    (resistance.max(0.0) / scale).min(0.75)
}

/// Picks a 0/25/50/75% resist bucket for a uniform `roll`.
///
/// The two buckets bracketing `average` are mixed so the expected resisted
/// fraction equals `average` exactly.
pub fn partial_resist_bucket(average: f64, roll: f64) -> f64 {
    let average = average.clamp(0.0, 0.75);
    let lower = (average * 4.0).floor() / 4.0;
    let upper_weight = (average - lower) * 4.0;
    if roll < upper_weight {
        (lower + 0.25).min(0.75)
    } else {
        lower
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boss_table_uses_level_three_row() {
        let config = SimConfig::default();
        let table = AttackTable::new(80, true, 83, false, &config);
        assert_eq!(table.base_melee_miss, 0.08);
        assert_eq!(table.base_spell_miss, 0.17);
        assert_eq!(table.base_parry, 0.14);
        assert_eq!(table.base_glance, 0.24);
        assert_eq!(table.crit_suppression, 0.048);
    }

    #[test]
    fn enemies_never_glance() {
        let config = SimConfig::default();
        let table = AttackTable::new(83, false, 80, true, &config);
        assert_eq!(table.base_glance, 0.0);
        assert_eq!(table.base_dodge, 0.0);
        assert!(table.defender_is_player);
    }

    #[test]
    fn armor_reduction_is_capped() {
        assert_eq!(armor_damage_modifier(0.0, 15232.5, 0.75), 1.0);
        let boss = armor_damage_modifier(10643.0, 15232.5, 0.75);
        assert!((boss - (1.0 - 10643.0 / 25875.5)).abs() < 1e-12);
        assert_eq!(armor_damage_modifier(1e9, 15232.5, 0.75), 0.25);
    }

    #[test]
    fn resist_buckets_average_to_the_mean() {
        let average = 0.33;
        let samples = 10_000;
        let total: f64 = (0..samples)
            .map(|i| partial_resist_bucket(average, (i as f64 + 0.5) / samples as f64))
            .sum();
        assert!((total / samples as f64 - average).abs() < 1e-3);
        assert_eq!(partial_resist_bucket(0.0, 0.0), 0.0);
        assert_eq!(partial_resist_bucket(0.75, 0.0), 0.75);
    }

    #[test]
    fn average_resist_saturates() {
        assert_eq!(average_resist(0.0, 80, 5.0), 0.0);
        assert_eq!(average_resist(400.0, 80, 5.0), 0.75);
        assert!((average_resist(100.0, 80, 5.0) - 0.25).abs() < 1e-12);
    }
}
