//! Periodic effects (damage and healing over time).
//!
//! A dot is a fixed number of ticks bound to an aura on its target. The aura
//! is the dot's visible state: while it is active, ticks fire at
//! `apply_time + k × tick_length` for `k = 1..=ticks`, and the final tick
//! deactivates it. Anything that ends the aura early (dispel, exclusive
//! displacement, the end-of-iteration sweep) silently cancels the remaining
//! ticks.
//!
//! [`apply_dot`](crate::Simulation::apply_dot) takes a fresh snapshot;
//! [`rollover_dot`](crate::Simulation::rollover_dot) restarts the tick count
//! while keeping the existing one.

mod engine;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::aura::AuraConfig;
use crate::effect::{BaseValue, EffectFn, EffectInstance, Snapshot};
use crate::ids::{AuraId, DotId, SpellId, UnitId};
use crate::outcome::OutcomePolicy;
use crate::sim::Simulation;

/// Where each tick reads its attacker-side values from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SnapshotMode {
    /// Base, multiplier and crit chance are captured at apply time.
    #[default]
    Snapshot,
    /// Every tick reads the caster's current stats.
    Live,
}

/// Immutable definition of a periodic effect.
#[derive(Clone)]
pub struct DotConfig {
    /// Aura carried by the target; its duration is managed by the ticks.
    pub aura: AuraConfig,
    pub ticks: u32,
    pub tick_length: Duration,
    /// Per-tick base amount.
    pub base: BaseValue,
    pub outcome: OutcomePolicy,
    pub mode: SnapshotMode,
    pub healing: bool,
    pub on_tick: Option<EffectFn>,
}

impl DotConfig {
    pub fn new(label: &'static str, ticks: u32, tick_length: Duration, base: impl Into<BaseValue>) -> Self {
        Self {
            aura: AuraConfig::new(label),
            ticks,
            tick_length,
            base: base.into(),
            outcome: OutcomePolicy::TICK,
            mode: SnapshotMode::Snapshot,
            healing: false,
            on_tick: None,
        }
    }

    /// Replaces the aura definition, keeping the dot's label.
    #[must_use]
    pub fn with_aura(mut self, aura: AuraConfig) -> Self {
        let label = self.aura.label;
        self.aura = AuraConfig { label, ..aura };
        self
    }

    #[must_use]
    pub fn with_outcome(mut self, outcome: OutcomePolicy) -> Self {
        self.outcome = outcome;
        self
    }

    #[must_use]
    pub fn live(mut self) -> Self {
        self.mode = SnapshotMode::Live;
        self
    }

    #[must_use]
    pub fn healing(mut self) -> Self {
        self.healing = true;
        self.outcome = OutcomePolicy::HEALING_TICK;
        self
    }

    #[must_use]
    pub fn on_tick(mut self, f: impl Fn(&mut Simulation, &EffectInstance) + Send + Sync + 'static) -> Self {
        self.on_tick = Some(Arc::new(f));
        self
    }

    /// Time from apply to the final tick.
    pub fn total_duration(&self) -> Duration {
        self.tick_length * self.ticks
    }
}

impl fmt::Debug for DotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DotConfig")
            .field("label", &self.aura.label)
            .field("ticks", &self.ticks)
            .field("tick_length", &self.tick_length)
            .field("base", &self.base)
            .field("outcome", &self.outcome)
            .field("mode", &self.mode)
            .field("healing", &self.healing)
            .finish_non_exhaustive()
    }
}

/// Registered periodic effect with its run-time state.
#[derive(Debug)]
pub struct Dot {
    pub(crate) id: DotId,
    pub(crate) spell: SpellId,
    pub(crate) target: UnitId,
    pub(crate) aura: AuraId,
    pub(crate) config: Arc<DotConfig>,
    pub(crate) remaining: u32,
    /// Bumped on apply, rollover and cancel; pending ticks of older epochs no-op.
    pub(crate) epoch: u64,
    pub(crate) snapshot: Option<Snapshot>,
}

impl Dot {
    pub fn id(&self) -> DotId {
        self.id
    }

    pub fn spell(&self) -> SpellId {
        self.spell
    }

    pub fn target(&self) -> UnitId {
        self.target
    }

    pub fn aura(&self) -> AuraId {
        self.aura
    }

    pub fn config(&self) -> &DotConfig {
        &self.config
    }

    pub fn remaining_ticks(&self) -> u32 {
        self.remaining
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        self.snapshot
    }

    pub(crate) fn reset(&mut self) {
        self.remaining = 0;
        self.snapshot = None;
        self.epoch += 1;
    }
}
