//! Rage bar: a rage pool fed by auto-attacks dealt and damage taken.
//!
//! # Formula
//!
//! ```text
//! white hit:    min((d × 7.5 / F + h × speed) / 2, d × 15 / F) × multiplier
//! damage taken: d × 2.5 / F
//! ```
//!
//! `F` is [`RAGE_FACTOR`], `h` is 3.5 for the main hand and 1.75 for the off
//! hand (doubled on crits), and `d` is the damage dealt, or the damage the
//! swing would have dealt when it was dodged or parried. Misses generate
//! nothing.

use super::{PoolKind, ResourceKind, ResourcePool};
use crate::aura::AuraConfig;
use crate::effect::EffectInstance;
use crate::error::ConfigError;
use crate::ids::{ActionId, AuraId, OtherAction, UnitId};
use crate::outcome::Outcome;
use crate::sim::Simulation;
use crate::spell::ProcMask;

pub const MAX_RAGE: f64 = 100.0;
pub const RAGE_FACTOR: f64 = 453.3;
pub const THREAT_PER_RAGE_GAINED: f64 = 5.0;

/// Label of the hidden aura that generates rage.
pub const RAGE_BAR_LABEL: &str = "Rage Bar";

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RageBarOptions {
    pub starting_rage: f64,
    pub rage_multiplier: f64,
    /// Main-hand weapon speed in seconds.
    pub main_hand_speed: f64,
    /// Off-hand weapon speed in seconds.
    pub off_hand_speed: f64,
}

impl Default for RageBarOptions {
    fn default() -> Self {
        Self {
            starting_rage: 0.0,
            rage_multiplier: 1.0,
            main_hand_speed: 3.6,
            off_hand_speed: 0.0,
        }
    }
}

/// Rage generated by one auto-attack.
pub fn white_hit_rage(damage: f64, weapon_speed: f64, off_hand: bool, crit: bool) -> f64 {
    let mut hit_factor = if off_hand { 1.75 } else { 3.5 };
    if crit {
        hit_factor *= 2.0;
    }
    let damage = damage.max(0.0);
    ((damage * 7.5 / RAGE_FACTOR + hit_factor * weapon_speed) / 2.0).min(damage * 15.0 / RAGE_FACTOR)
}

/// Rage generated by taking `damage`.
pub fn damage_taken_rage(damage: f64) -> f64 {
    damage.max(0.0) * 2.5 / RAGE_FACTOR
}

fn rage_for_dealt(instance: &EffectInstance, options: &RageBarOptions) -> f64 {
    if instance.outcome == Outcome::Miss {
        return 0.0;
    }
    // On-next-swing replacers carry the special mask as well.
    if !instance.proc_mask.intersects(ProcMask::MELEE_WHITE)
        || instance.proc_mask.contains(ProcMask::MELEE_MH_SPECIAL)
    {
        return 0.0;
    }
    let off_hand = instance.proc_mask.contains(ProcMask::MELEE_OH_AUTO);
    let speed = if off_hand {
        options.off_hand_speed
    } else {
        options.main_hand_speed
    };
    let damage = if instance.outcome.is_avoided() {
        instance.pre_outcome_amount
    } else {
        instance.amount
    };
    white_hit_rage(damage, speed, off_hand, instance.is_crit()) * options.rage_multiplier
}

fn gain_rage(sim: &mut Simulation, unit: UnitId, rage: f64, source: ActionId) {
    if let Err(err) = sim.gain_resource(unit, ResourceKind::Rage, rage, source) {
        tracing::warn!(%unit, %source, %err, "rage gain failed");
    }
}

impl Simulation {
    /// Gives `unit` a rage pool and the aura that fills it.
    pub fn enable_rage_bar(&mut self, unit: UnitId, options: RageBarOptions) -> Result<AuraId, ConfigError> {
        if options.rage_multiplier < 0.0 || options.main_hand_speed < 0.0 || options.off_hand_speed < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "rage bar options",
                reason: "must not be negative",
            });
        }
        self.add_pool(
            unit,
            ResourcePool::new(ResourceKind::Rage, PoolKind::Soft, MAX_RAGE)
                .with_starting(options.starting_rage)
                .with_threat_per_unit_gained(THREAT_PER_RAGE_GAINED),
        )?;

        let aura = AuraConfig::new(RAGE_BAR_LABEL)
            .permanent()
            .on_reset(|sim, aura| sim.activate_aura(aura))
            .on_effect_dealt(move |sim, aura, instance| {
                let rage = rage_for_dealt(instance, &options);
                if rage > 0.0 {
                    gain_rage(sim, aura.unit, rage, ActionId::other(OtherAction::DamageDealt));
                }
            })
            .on_effect_taken(|sim, aura, instance| {
                if instance.amount > 0.0 {
                    let rage = damage_taken_rage(instance.amount);
                    gain_rage(sim, aura.unit, rage, ActionId::other(OtherAction::DamageTaken));
                }
            });
        self.register_aura(unit, aura)
    }

    /// Threat from rage gained this iteration. Only abilities that have not
    /// dealt damage this iteration count; auto-attacks, damage taken and
    /// refunds never do.
    pub fn rage_threat(&self, unit: UnitId) -> f64 {
        let owner = self.unit(unit);
        owner
            .pool(ResourceKind::Rage)
            .map_or(0.0, |pool| pool.threat_from_gains(|source| owner.gain_generates_threat(source)))
    }
}
