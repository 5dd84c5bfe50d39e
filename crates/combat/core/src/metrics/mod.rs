//! Per-ability, per-target accumulators.
//!
//! [`SpellMetrics`] hold the current iteration; at the end of every iteration
//! they are folded into an [`AggregateMetrics`] (mean and standard deviation
//! across iterations) and cleared.

mod aggregate;

pub use aggregate::{
    AggregateMetrics, EncounterSummary, ResourceKey, ResourceSummary, RunningStat, SpellSummary, UnitSummary,
};
pub(crate) use aggregate::{ResourceIteration, UnitIteration};

use crate::effect::EffectInstance;
use crate::outcome::Outcome;

/// Counters of one ability against one target for the current iteration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellMetrics {
    pub casts: u64,
    pub hits: u64,
    pub crits: u64,
    pub misses: u64,
    pub dodges: u64,
    pub parries: u64,
    pub blocks: u64,
    pub glances: u64,
    pub partial_resists: u64,
    pub ticks: u64,
    pub crit_ticks: u64,
    pub total_damage: f64,
    pub total_healing: f64,
    pub total_threat: f64,
    /// Damage dealt by critical strikes, included in `total_damage`.
    pub total_crit_damage: f64,
}

impl SpellMetrics {
    /// Records a delivered instance.
    pub fn record(&mut self, instance: &EffectInstance) {
        if instance.periodic {
            self.ticks += 1;
            if instance.is_crit() {
                self.crit_ticks += 1;
            }
        } else {
            match instance.outcome {
                Outcome::Miss => self.misses += 1,
                Outcome::Dodge => self.dodges += 1,
                Outcome::Parry => self.parries += 1,
                Outcome::Block => self.blocks += 1,
                Outcome::Glance => self.glances += 1,
                Outcome::Hit => self.hits += 1,
                Outcome::Crit => self.crits += 1,
                Outcome::PartialResist => self.partial_resists += 1,
            }
        }

        if instance.healing {
            self.total_healing += instance.amount;
        } else {
            self.total_damage += instance.amount;
            if instance.is_crit() {
                self.total_crit_damage += instance.amount;
            }
        }
        self.total_threat += instance.threat;
    }

    /// Direct results that reached the target.
    pub fn landed(&self) -> u64 {
        self.hits + self.crits + self.blocks + self.glances + self.partial_resists
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
