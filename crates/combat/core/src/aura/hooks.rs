//! Fixed-shape hook set carried by every aura.
//!
//! Hooks are reference-counted so the engine can clone the ones it is about to
//! call out of the unit tables before handing `&mut Simulation` to them.

use std::fmt;
use std::sync::Arc;

use crate::effect::EffectInstance;
use crate::ids::AuraId;
use crate::sim::Simulation;

pub type AuraFn = Arc<dyn Fn(&mut Simulation, AuraId) + Send + Sync>;

/// Called with `(old_stacks, new_stacks)`.
pub type StacksFn = Arc<dyn Fn(&mut Simulation, AuraId, u32, u32) + Send + Sync>;

pub type AuraEffectFn = Arc<dyn Fn(&mut Simulation, AuraId, &EffectInstance) + Send + Sync>;

/// Adjusts a damage instance taken by the aura's owner after its outcome is
/// known. The amount is clamped at zero afterwards.
pub type OutcomeModifierFn = Arc<dyn Fn(&Simulation, AuraId, &mut EffectInstance) + Send + Sync>;

/// Which effect listener to dispatch to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectHook {
    /// Owner dealt direct damage.
    Dealt,
    /// Owner took direct damage.
    Taken,
    /// Owner's damage over time ticked.
    PeriodicDealt,
    /// Owner took a damage-over-time tick.
    PeriodicTaken,
    HealDealt,
    HealTaken,
    PeriodicHealDealt,
    PeriodicHealTaken,
}

impl EffectHook {
    /// Dealt and taken listeners for `instance`.
    pub fn for_instance(instance: &EffectInstance) -> (Self, Self) {
        match (instance.periodic, instance.healing) {
            (false, false) => (Self::Dealt, Self::Taken),
            (true, false) => (Self::PeriodicDealt, Self::PeriodicTaken),
            (false, true) => (Self::HealDealt, Self::HealTaken),
            (true, true) => (Self::PeriodicHealDealt, Self::PeriodicHealTaken),
        }
    }
}

#[derive(Clone, Default)]
pub struct AuraHooks {
    pub on_gain: Option<AuraFn>,
    /// Called instead of `on_gain` when an active aura is re-activated.
    pub on_refresh: Option<AuraFn>,
    pub on_stacks_change: Option<StacksFn>,
    pub on_expire: Option<AuraFn>,
    /// Called at the start of every iteration, after the state reset.
    pub on_reset: Option<AuraFn>,
    pub on_effect_dealt: Option<AuraEffectFn>,
    pub on_effect_taken: Option<AuraEffectFn>,
    pub on_periodic_dealt: Option<AuraEffectFn>,
    pub on_periodic_taken: Option<AuraEffectFn>,
    pub on_heal_dealt: Option<AuraEffectFn>,
    pub on_heal_taken: Option<AuraEffectFn>,
    pub on_periodic_heal_dealt: Option<AuraEffectFn>,
    pub on_periodic_heal_taken: Option<AuraEffectFn>,
    pub post_outcome_taken: Option<OutcomeModifierFn>,
}

impl AuraHooks {
    pub fn effect(&self, hook: EffectHook) -> Option<&AuraEffectFn> {
        match hook {
            EffectHook::Dealt => self.on_effect_dealt.as_ref(),
            EffectHook::Taken => self.on_effect_taken.as_ref(),
            EffectHook::PeriodicDealt => self.on_periodic_dealt.as_ref(),
            EffectHook::PeriodicTaken => self.on_periodic_taken.as_ref(),
            EffectHook::HealDealt => self.on_heal_dealt.as_ref(),
            EffectHook::HealTaken => self.on_heal_taken.as_ref(),
            EffectHook::PeriodicHealDealt => self.on_periodic_heal_dealt.as_ref(),
            EffectHook::PeriodicHealTaken => self.on_periodic_heal_taken.as_ref(),
        }
    }
}

impl fmt::Debug for AuraHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        let named = [
            ("on_gain", self.on_gain.is_some()),
            ("on_refresh", self.on_refresh.is_some()),
            ("on_stacks_change", self.on_stacks_change.is_some()),
            ("on_expire", self.on_expire.is_some()),
            ("on_reset", self.on_reset.is_some()),
            ("on_effect_dealt", self.on_effect_dealt.is_some()),
            ("on_effect_taken", self.on_effect_taken.is_some()),
            ("on_periodic_dealt", self.on_periodic_dealt.is_some()),
            ("on_periodic_taken", self.on_periodic_taken.is_some()),
            ("on_heal_dealt", self.on_heal_dealt.is_some()),
            ("on_heal_taken", self.on_heal_taken.is_some()),
            ("on_periodic_heal_dealt", self.on_periodic_heal_dealt.is_some()),
            ("on_periodic_heal_taken", self.on_periodic_heal_taken.is_some()),
            ("post_outcome_taken", self.post_outcome_taken.is_some()),
        ];
        for (name, present) in named {
            if present {
                set.entry(&name);
            }
        }
        set.finish()
    }
}
