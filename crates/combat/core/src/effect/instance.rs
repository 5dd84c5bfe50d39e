use std::sync::Arc;

use crate::ids::{ActionId, SpellId, UnitId};
use crate::outcome::Outcome;
use crate::sim::Simulation;
use crate::spell::ProcMask;
use crate::stats::School;

/// Attacker-side values captured when a periodic effect is applied.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    /// Base amount evaluated at apply time.
    pub base: f64,
    /// Attacker damage (or healing) multiplier at apply time.
    pub multiplier: f64,
    /// Crit chance at apply time.
    pub crit_chance: f64,
}

/// Where attacker-side modifiers come from.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModifierMode {
    /// Read the attacker's current stats.
    #[default]
    Live,
    /// Reuse values captured at apply time.
    Snapshot(Snapshot),
}

/// One resolved (or in-flight) damage or healing event.
///
/// Not `Clone`: delivery consumes the instance.
#[derive(Debug)]
pub struct EffectInstance {
    pub id: u64,
    pub spell: SpellId,
    pub action: ActionId,
    pub actor: UnitId,
    pub target: UnitId,
    pub school: School,
    pub proc_mask: ProcMask,
    pub amount: f64,
    /// Amount after target modifiers but before the outcome was applied.
    pub pre_outcome_amount: f64,
    pub outcome: Outcome,
    pub periodic: bool,
    pub healing: bool,
    /// Resisted fraction (0, 0.25, 0.5 or 0.75) for magic damage.
    pub resisted: f64,
    pub threat: f64,
    pub mode: ModifierMode,
}

impl EffectInstance {
    pub fn landed(&self) -> bool {
        self.outcome.landed()
    }

    pub fn is_crit(&self) -> bool {
        self.outcome.is_crit()
    }
}

/// Copyable summary of a delivered instance.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolvedEffect {
    pub target: UnitId,
    pub outcome: Outcome,
    pub amount: f64,
    pub threat: f64,
}

impl From<&EffectInstance> for ResolvedEffect {
    fn from(instance: &EffectInstance) -> Self {
        Self {
            target: instance.target,
            outcome: instance.outcome,
            amount: instance.amount,
            threat: instance.threat,
        }
    }
}

/// Callback receiving a delivered instance (`on_resolved`, dot `on_tick`).
pub type EffectFn = Arc<dyn Fn(&mut Simulation, &EffectInstance) + Send + Sync>;

/// Extra threat computed from the delivered instance.
pub type ThreatFn = Arc<dyn Fn(&EffectInstance) -> f64 + Send + Sync>;
