//! Deterministic discrete-event combat resolution.
//!
//! `combat-core` resolves abilities between combatants on a simulated clock:
//! casts and cooldowns, attack-table outcomes, damage and healing through a
//! fixed-order pipeline, buffs and debuffs, periodic effects and resource
//! pools. One [`Simulation`] owns every combatant of a run; all mutation flows
//! through scheduler callbacks or direct driver calls between
//! [`Simulation::advance`] calls. Independent iterations can be spread across
//! threads with [`sim::batch::run_batch`].
//!
//! Randomness comes from named per-decision streams, so a run is reproducible
//! from its seed and adding a roll to one mechanic does not perturb the others.
pub mod aura;
pub mod config;
pub mod effect;
pub mod error;
pub mod ids;
pub mod metrics;
pub mod outcome;
pub mod periodic;
pub mod resource;
pub mod rng;
pub mod scheduler;
pub mod sim;
pub mod spell;
pub mod stats;
pub mod time;

pub use aura::{Aura, AuraConfig, AuraStats, StackChange};
pub use config::{LevelTable, RatingConversions, SimConfig};
pub use effect::{BaseContext, BaseValue, EffectInstance, ModifierMode, ResolvedEffect, Snapshot};
pub use error::{ConfigError, Diagnostics, ErrorSeverity, InvariantViolation, SimError};
pub use ids::{ActionId, AuraId, DotId, OtherAction, SpellId, UnitId};
pub use metrics::{AggregateMetrics, SpellMetrics};
pub use outcome::{AttackKind, Outcome, OutcomeLayers, OutcomePolicy, OutcomeTiming};
pub use periodic::{Dot, DotConfig, SnapshotMode};
pub use resource::{PoolKind, RageBarOptions, ResourceError, ResourceKind, ResourcePool};
pub use sim::{Encounter, Simulation, Unit, UnitConfig, UnitKind};
pub use spell::{
    CastPhase, CastRefusal, Cost, EffectTemplate, FollowUp, ProcMask, SpellConfig, SpellEffect,
    SpellFlags,
};
pub use stats::{Bonus, BonusSource, Multiplier, School, Stat, StatTarget, UnitStats};
pub use time::SimTime;
