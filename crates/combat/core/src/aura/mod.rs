//! Buff/debuff state machine.
//!
//! ```text
//!            activate                 expire / deactivate
//! Inactive ────────────▶ Active ─────────────────────────▶ Inactive
//!                         │  ▲
//!                         └──┘ activate (refresh), stack changes, extend
//! ```
//!
//! Exactly one aura exists per (owner, label). `on_expire` runs exactly once
//! per activation, whether the aura timed out, was removed, lost its last
//! stack, was displaced from an exclusive category, or was swept by the
//! end-of-iteration reset. Stat bonuses declared on the config are applied on
//! gain and removed on expire, so they always revert in matching pairs.

mod hooks;
mod lifecycle;

pub use hooks::{AuraEffectFn, AuraFn, AuraHooks, EffectHook, OutcomeModifierFn, StacksFn};

use std::sync::Arc;
use std::time::Duration;

use crate::effect::EffectInstance;
use crate::ids::{ActionId, AuraId};
use crate::sim::Simulation;
use crate::stats::{Bonus, StatTarget};
use crate::time::SimTime;

/// Result of a stack operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackChange {
    Changed { old: u32, new: u32 },
    Unchanged,
    /// Request exceeded the maximum; stacks were clamped to it.
    Capped,
    /// The aura is not active; nothing changed.
    Inactive,
}

/// Immutable definition of an aura.
#[derive(Clone, Debug)]
pub struct AuraConfig {
    pub label: &'static str,
    pub action_id: Option<ActionId>,
    /// `None` for permanent auras.
    pub duration: Option<Duration>,
    /// Zero for auras without a stack counter.
    pub max_stacks: u32,
    pub initial_stacks: u32,
    /// Mutually exclusive category; one holder per owner.
    pub category: Option<&'static str>,
    /// Applied on gain, removed on expire.
    pub stat_bonuses: Vec<(StatTarget, Bonus)>,
    pub hooks: AuraHooks,
}

impl AuraConfig {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            action_id: None,
            duration: None,
            max_stacks: 0,
            initial_stacks: 0,
            category: None,
            stat_bonuses: Vec::new(),
            hooks: AuraHooks::default(),
        }
    }

    #[must_use]
    pub fn with_action(mut self, action_id: ActionId) -> Self {
        self.action_id = Some(action_id);
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    #[must_use]
    pub fn permanent(mut self) -> Self {
        self.duration = None;
        self
    }

    #[must_use]
    pub fn with_stacks(mut self, max_stacks: u32, initial_stacks: u32) -> Self {
        self.max_stacks = max_stacks;
        self.initial_stacks = initial_stacks;
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: &'static str) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn with_bonus(mut self, target: impl Into<StatTarget>, bonus: Bonus) -> Self {
        self.stat_bonuses.push((target.into(), bonus));
        self
    }

    #[must_use]
    pub fn on_gain(mut self, f: impl Fn(&mut Simulation, AuraId) + Send + Sync + 'static) -> Self {
        self.hooks.on_gain = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_refresh(
        mut self,
        f: impl Fn(&mut Simulation, AuraId) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.on_refresh = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_stacks_change(
        mut self,
        f: impl Fn(&mut Simulation, AuraId, u32, u32) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.on_stacks_change = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_expire(
        mut self,
        f: impl Fn(&mut Simulation, AuraId) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.on_expire = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_reset(mut self, f: impl Fn(&mut Simulation, AuraId) + Send + Sync + 'static) -> Self {
        self.hooks.on_reset = Some(Arc::new(f));
        self
    }

    /// Direct damage dealt by the owner. Healing has its own listeners.
    #[must_use]
    pub fn on_effect_dealt(
        mut self,
        f: impl Fn(&mut Simulation, AuraId, &EffectInstance) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.on_effect_dealt = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_effect_taken(
        mut self,
        f: impl Fn(&mut Simulation, AuraId, &EffectInstance) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.on_effect_taken = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_periodic_dealt(
        mut self,
        f: impl Fn(&mut Simulation, AuraId, &EffectInstance) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.on_periodic_dealt = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_periodic_taken(
        mut self,
        f: impl Fn(&mut Simulation, AuraId, &EffectInstance) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.on_periodic_taken = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_heal_dealt(
        mut self,
        f: impl Fn(&mut Simulation, AuraId, &EffectInstance) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.on_heal_dealt = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_heal_taken(
        mut self,
        f: impl Fn(&mut Simulation, AuraId, &EffectInstance) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.on_heal_taken = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_periodic_heal_dealt(
        mut self,
        f: impl Fn(&mut Simulation, AuraId, &EffectInstance) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.on_periodic_heal_dealt = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_periodic_heal_taken(
        mut self,
        f: impl Fn(&mut Simulation, AuraId, &EffectInstance) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.on_periodic_heal_taken = Some(Arc::new(f));
        self
    }

    /// Modifies damage the owner takes once its outcome is rolled, e.g. a
    /// reduction that only applies to critical hits.
    #[must_use]
    pub fn with_post_outcome_modifier(
        mut self,
        f: impl Fn(&Simulation, AuraId, &mut EffectInstance) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.post_outcome_taken = Some(Arc::new(f));
        self
    }
}

/// Lifetime counters of one aura, never reset between iterations.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AuraStats {
    pub gains: u64,
    pub refreshes: u64,
    pub expirations: u64,
    pub uptime: Duration,
}

/// Registered aura with its run-time state.
#[derive(Debug)]
pub struct Aura {
    pub(crate) id: AuraId,
    pub(crate) config: Arc<AuraConfig>,
    pub(crate) active: bool,
    pub(crate) stacks: u32,
    pub(crate) gained_at: SimTime,
    pub(crate) expires_at: SimTime,
    /// Bumped on every activation from inactive.
    pub(crate) epoch: u64,
    /// Bumped whenever a pending expiry becomes stale.
    pub(crate) expiry_token: u64,
    pub(crate) stats: AuraStats,
}

impl Aura {
    pub(crate) fn new(id: AuraId, config: AuraConfig) -> Self {
        Self {
            id,
            config: Arc::new(config),
            active: false,
            stacks: 0,
            gained_at: SimTime::ZERO,
            expires_at: SimTime::NEVER,
            epoch: 0,
            expiry_token: 0,
            stats: AuraStats::default(),
        }
    }

    pub fn id(&self) -> AuraId {
        self.id
    }

    pub fn label(&self) -> &'static str {
        self.config.label
    }

    pub fn config(&self) -> &AuraConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn stacks(&self) -> u32 {
        self.stacks
    }

    pub fn expires_at(&self) -> SimTime {
        self.expires_at
    }

    pub fn stats(&self) -> AuraStats {
        self.stats
    }

    /// Remaining duration; `None` when inactive or permanent.
    pub fn remaining(&self, now: SimTime) -> Option<Duration> {
        (self.active && !self.expires_at.is_never()).then(|| now.until(self.expires_at))
    }
}

/// Current holder of an exclusive category on one unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ExclusiveSlot {
    pub category: &'static str,
    pub holder: Option<AuraId>,
}
