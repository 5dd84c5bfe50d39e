//! Immutable ability configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::effect::{BaseValue, EffectFn, ThreatFn};
use crate::error::ConfigError;
use crate::ids::{ActionId, AuraId, SpellId, UnitId};
use crate::outcome::{OutcomePolicy, OutcomeTiming};
use crate::resource::ResourceKind;
use crate::sim::Simulation;
use crate::stats::School;

bitflags::bitflags! {
    /// Pipeline switches of an ability.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SpellFlags: u16 {
        /// Skip the caster's general, school and disease multipliers.
        const IGNORE_ATTACKER_MODIFIERS = 1 << 0;
        /// Skip the target's taken multipliers.
        const IGNORE_TARGET_MODIFIERS = 1 << 1;
        /// Add the target's flat physical bonus damage taken.
        const INCLUDE_TARGET_BONUS_DAMAGE = 1 << 2;
        /// Skip armor and partial resists.
        const IGNORE_RESISTS = 1 << 3;
        /// Subject to disease dealt/taken multipliers.
        const DISEASE = 1 << 4;
        /// Cast time and global cooldown are not scaled by cast speed.
        const IGNORE_HASTE = 1 << 5;
        /// Do not record per-ability metrics.
        const NO_METRICS = 1 << 6;
        /// Do not emit per-event logs.
        const NO_LOGS = 1 << 7;
    }
}

bitflags::bitflags! {
    /// What kind of event an ability produces, for proc conditions.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ProcMask: u16 {
        const MELEE_MH_AUTO = 1 << 0;
        const MELEE_OH_AUTO = 1 << 1;
        const MELEE_MH_SPECIAL = 1 << 2;
        const MELEE_OH_SPECIAL = 1 << 3;
        const RANGED_AUTO = 1 << 4;
        const RANGED_SPECIAL = 1 << 5;
        const SPELL_DAMAGE = 1 << 6;
        const SPELL_HEALING = 1 << 7;
        const PERIODIC_DAMAGE = 1 << 8;
        const PERIODIC_HEALING = 1 << 9;

        const MELEE_WHITE = Self::MELEE_MH_AUTO.bits() | Self::MELEE_OH_AUTO.bits();
        const MELEE_OH = Self::MELEE_OH_AUTO.bits() | Self::MELEE_OH_SPECIAL.bits();
        const MELEE = Self::MELEE_WHITE.bits()
            | Self::MELEE_MH_SPECIAL.bits()
            | Self::MELEE_OH_SPECIAL.bits();
    }
}

/// When an ability's cost is deducted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CostTiming {
    #[default]
    OnCastStart,
    OnCastComplete,
}

/// Resource cost of an ability.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cost {
    pub kind: ResourceKind,
    pub amount: f64,
    pub timing: CostTiming,
    /// Fraction of the cost returned when the direct effect does not land.
    pub refund_on_miss: f64,
}

impl Cost {
    pub const fn new(kind: ResourceKind, amount: f64) -> Self {
        Self {
            kind,
            amount,
            timing: CostTiming::OnCastStart,
            refund_on_miss: 0.0,
        }
    }

    #[must_use]
    pub const fn on_complete(mut self) -> Self {
        self.timing = CostTiming::OnCastComplete;
        self
    }

    #[must_use]
    pub const fn with_refund(mut self, fraction: f64) -> Self {
        self.refund_on_miss = fraction;
        self
    }
}

/// Cooldown with optional charges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CooldownConfig {
    pub duration: Duration,
    pub charges: u32,
}

/// Timing and cost policy of an ability.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CastConfig {
    pub cost: Option<Cost>,
    pub cast_time: Duration,
    /// Global cooldown triggered by the cast; zero for off-GCD abilities.
    pub gcd: Duration,
    /// Time the caster stays busy after completion (channelled abilities).
    pub channel_time: Duration,
    pub cooldown: Option<CooldownConfig>,
}

/// Callback run with the spell and its target (custom effects).
pub type SpellFn = Arc<dyn Fn(&mut Simulation, SpellId, UnitId) + Send + Sync>;

/// What happens after a direct effect landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FollowUp {
    /// Apply (with a fresh snapshot) this spell's periodic effect on the target.
    ApplyDot,
    /// Roll over this spell's periodic effect on the target, keeping its snapshot.
    RolloverDot,
    /// Activate an aura.
    ActivateAura(AuraId),
}

/// Damage or healing produced by an ability.
#[derive(Clone)]
pub struct EffectTemplate {
    pub base: BaseValue,
    /// Required for any template that produces an amount.
    pub outcome: Option<OutcomePolicy>,
    pub on_resolved: Option<EffectFn>,
    pub follow_up: Option<FollowUp>,
}

impl EffectTemplate {
    pub fn new(base: impl Into<BaseValue>, outcome: OutcomePolicy) -> Self {
        Self {
            base: base.into(),
            outcome: Some(outcome),
            on_resolved: None,
            follow_up: None,
        }
    }

    #[must_use]
    pub fn on_resolved(
        mut self,
        f: impl Fn(&mut Simulation, &crate::effect::EffectInstance) + Send + Sync + 'static,
    ) -> Self {
        self.on_resolved = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn with_follow_up(mut self, follow_up: FollowUp) -> Self {
        self.follow_up = Some(follow_up);
        self
    }
}

impl fmt::Debug for EffectTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectTemplate")
            .field("base", &self.base)
            .field("outcome", &self.outcome)
            .field("on_resolved", &self.on_resolved.is_some())
            .field("follow_up", &self.follow_up)
            .finish()
    }
}

/// Effect applied when a cast completes.
#[derive(Clone, Default)]
pub enum SpellEffect {
    /// Nothing beyond cost, cooldown and metrics (e.g. a pure trigger).
    #[default]
    None,
    Damage(EffectTemplate),
    Healing(EffectTemplate),
    /// Damage to every hostile unit; base computed once and shared.
    AoeDamage(EffectTemplate),
    /// Periodic effect only: apply this spell's dot on the target.
    ApplyDot,
    ActivateAura(AuraId),
    Custom(SpellFn),
}

impl fmt::Debug for SpellEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Damage(t) => f.debug_tuple("Damage").field(t).finish(),
            Self::Healing(t) => f.debug_tuple("Healing").field(t).finish(),
            Self::AoeDamage(t) => f.debug_tuple("AoeDamage").field(t).finish(),
            Self::ApplyDot => f.write_str("ApplyDot"),
            Self::ActivateAura(aura) => f.debug_tuple("ActivateAura").field(aura).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Immutable definition of an ability.
#[derive(Clone)]
pub struct SpellConfig {
    pub label: &'static str,
    pub action_id: ActionId,
    pub school: School,
    pub flags: SpellFlags,
    pub proc_mask: ProcMask,
    pub cast: CastConfig,
    /// Spell-local damage or healing multiplier.
    pub damage_multiplier: f64,
    pub crit_multiplier: f64,
    pub threat_multiplier: f64,
    pub flat_threat_bonus: f64,
    pub dynamic_threat: Option<ThreatFn>,
    pub bonus_hit_rating: f64,
    pub bonus_crit_rating: f64,
    /// Yards per second; zero delivers instantly.
    pub missile_speed: f64,
    pub outcome_timing: OutcomeTiming,
    pub effect: SpellEffect,
}

impl SpellConfig {
    pub fn new(label: &'static str, action_id: ActionId, school: School) -> Self {
        Self {
            label,
            action_id,
            school,
            flags: SpellFlags::empty(),
            proc_mask: ProcMask::empty(),
            cast: CastConfig::default(),
            damage_multiplier: 1.0,
            crit_multiplier: 2.0,
            threat_multiplier: 1.0,
            flat_threat_bonus: 0.0,
            dynamic_threat: None,
            bonus_hit_rating: 0.0,
            bonus_crit_rating: 0.0,
            missile_speed: 0.0,
            outcome_timing: OutcomeTiming::AtCast,
            effect: SpellEffect::None,
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: SpellFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[must_use]
    pub fn with_proc_mask(mut self, mask: ProcMask) -> Self {
        self.proc_mask = mask;
        self
    }

    #[must_use]
    pub fn with_cost(mut self, cost: Cost) -> Self {
        self.cast.cost = Some(cost);
        self
    }

    #[must_use]
    pub fn with_cast_time(mut self, cast_time: Duration) -> Self {
        self.cast.cast_time = cast_time;
        self
    }

    #[must_use]
    pub fn with_gcd(mut self, gcd: Duration) -> Self {
        self.cast.gcd = gcd;
        self
    }

    #[must_use]
    pub fn with_channel(mut self, channel_time: Duration) -> Self {
        self.cast.channel_time = channel_time;
        self
    }

    #[must_use]
    pub fn with_cooldown(mut self, duration: Duration) -> Self {
        self.cast.cooldown = Some(CooldownConfig {
            duration,
            charges: 1,
        });
        self
    }

    #[must_use]
    pub fn with_charges(mut self, duration: Duration, charges: u32) -> Self {
        self.cast.cooldown = Some(CooldownConfig { duration, charges });
        self
    }

    #[must_use]
    pub fn with_damage_multiplier(mut self, multiplier: f64) -> Self {
        self.damage_multiplier = multiplier;
        self
    }

    #[must_use]
    pub fn with_crit_multiplier(mut self, multiplier: f64) -> Self {
        self.crit_multiplier = multiplier;
        self
    }

    #[must_use]
    pub fn with_threat(mut self, multiplier: f64, flat_bonus: f64) -> Self {
        self.threat_multiplier = multiplier;
        self.flat_threat_bonus = flat_bonus;
        self
    }

    #[must_use]
    pub fn with_dynamic_threat(
        mut self,
        f: impl Fn(&crate::effect::EffectInstance) -> f64 + Send + Sync + 'static,
    ) -> Self {
        self.dynamic_threat = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn with_bonus_ratings(mut self, hit: f64, crit: f64) -> Self {
        self.bonus_hit_rating = hit;
        self.bonus_crit_rating = crit;
        self
    }

    #[must_use]
    pub fn with_missile_speed(mut self, speed: f64, timing: OutcomeTiming) -> Self {
        self.missile_speed = speed;
        self.outcome_timing = timing;
        self
    }

    #[must_use]
    pub fn with_effect(mut self, effect: SpellEffect) -> Self {
        self.effect = effect;
        self
    }

    /// Checks the parts of the definition that do not depend on other
    /// registrations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let template = match &self.effect {
            SpellEffect::Damage(t) | SpellEffect::Healing(t) | SpellEffect::AoeDamage(t) => Some(t),
            _ => None,
        };
        if template.is_some_and(|t| t.outcome.is_none()) {
            return Err(ConfigError::MissingOutcomePolicy { label: self.label });
        }
        if let Some(cost) = self.cast.cost {
            if !(cost.amount >= 0.0) {
                return Err(ConfigError::InvalidValue {
                    field: "cost",
                    reason: "must not be negative",
                });
            }
            if !(0.0..=1.0).contains(&cost.refund_on_miss) {
                return Err(ConfigError::InvalidValue {
                    field: "refund_on_miss",
                    reason: "must lie in [0, 1]",
                });
            }
        }
        if self.cast.cooldown.is_some_and(|cd| cd.charges == 0) {
            return Err(ConfigError::InvalidValue {
                field: "cooldown.charges",
                reason: "must be at least one",
            });
        }
        if !(self.missile_speed >= 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "missile_speed",
                reason: "must not be negative",
            });
        }
        Ok(())
    }
}

impl fmt::Debug for SpellConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpellConfig")
            .field("label", &self.label)
            .field("action_id", &self.action_id)
            .field("school", &self.school)
            .field("flags", &self.flags)
            .field("cast", &self.cast)
            .field("effect", &self.effect)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_without_outcome_policy_is_rejected() {
        let mut template = EffectTemplate::new(100.0, OutcomePolicy::ALWAYS_HIT);
        template.outcome = None;
        let config = SpellConfig::new("Broken", ActionId::spell(1), School::Fire)
            .with_effect(SpellEffect::Damage(template));

        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingOutcomePolicy { label: "Broken" })
        );
    }

    #[test]
    fn zero_charge_cooldowns_are_rejected() {
        let config = SpellConfig::new("Charges", ActionId::spell(2), School::Physical)
            .with_charges(Duration::from_secs(10), 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn white_mask_covers_both_hands() {
        assert!(ProcMask::MELEE_WHITE.contains(ProcMask::MELEE_OH_AUTO));
        assert!(ProcMask::MELEE.contains(ProcMask::MELEE_MH_SPECIAL));
        assert!(!ProcMask::MELEE.intersects(ProcMask::SPELL_DAMAGE));
    }
}
