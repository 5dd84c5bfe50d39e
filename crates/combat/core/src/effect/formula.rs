//! Base-value formulas (step 1 of the pipeline).

use std::fmt;
use std::sync::Arc;

use crate::ids::{SpellId, UnitId};
use crate::resource::ResourceKind;
use crate::rng::streams;
use crate::sim::Simulation;
use crate::stats::Stat;

/// Who a formula is evaluated for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BaseContext {
    pub actor: UnitId,
    /// `None` for shared AOE bases computed once for every target.
    pub target: Option<UnitId>,
    pub spell: Option<SpellId>,
}

/// User-supplied base-value calculator.
pub type BaseFn = Arc<dyn Fn(&mut Simulation, &BaseContext) -> f64 + Send + Sync>;

/// How the base amount of an effect is computed.
#[derive(Clone)]
pub enum BaseValue {
    /// Fixed constant value.
    Flat(f64),

    /// Uniform roll in `[min, max]` from the "Damage Roll" stream.
    Roll { min: f64, max: f64 },

    /// `coefficient × caster stat` (live value at evaluation time).
    CasterStat { stat: Stat, coefficient: f64 },

    /// `coefficient × target stat`; zero without a target.
    TargetStat { stat: Stat, coefficient: f64 },

    /// `fraction × target's current resource`; zero without the pool.
    TargetResource { resource: ResourceKind, fraction: f64 },

    /// `fraction × (capacity - current)` of the target's resource.
    TargetMissingResource { resource: ResourceKind, fraction: f64 },

    /// Sum of sub-formulas.
    Sum(Vec<BaseValue>),

    /// Product of sub-formulas.
    Product(Vec<BaseValue>),

    /// Minimum of sub-formulas; zero when empty.
    Min(Vec<BaseValue>),

    /// Maximum of sub-formulas; zero when empty.
    Max(Vec<BaseValue>),

    Custom(BaseFn),
}

impl BaseValue {
    /// `flat + coefficient × caster stat`, the usual spell-power/attack-power scaling.
    pub fn scaled(flat: f64, stat: Stat, coefficient: f64) -> Self {
        Self::Sum(vec![Self::Flat(flat), Self::CasterStat { stat, coefficient }])
    }

    /// Rolled range plus caster stat scaling.
    pub fn roll_scaled(min: f64, max: f64, stat: Stat, coefficient: f64) -> Self {
        Self::Sum(vec![
            Self::Roll { min, max },
            Self::CasterStat { stat, coefficient },
        ])
    }

    pub fn custom(f: impl Fn(&mut Simulation, &BaseContext) -> f64 + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    /// Evaluates the formula against the live state of `sim`.
    pub fn evaluate(&self, sim: &mut Simulation, ctx: &BaseContext) -> f64 {
        match self {
            Self::Flat(value) => *value,

            Self::Roll { min, max } => sim.rng_mut().roll(streams::DAMAGE_ROLL, *min, *max),

            Self::CasterStat { stat, coefficient } => {
                sim.unit(ctx.actor).stats().stat(*stat) * coefficient
            }

            Self::TargetStat { stat, coefficient } => ctx
                .target
                .map(|target| sim.unit(target).stats().stat(*stat) * coefficient)
                .unwrap_or(0.0),

            Self::TargetResource { resource, fraction } => ctx
                .target
                .and_then(|target| sim.unit(target).pool(*resource))
                .map(|pool| pool.current() * fraction)
                .unwrap_or(0.0),

            Self::TargetMissingResource { resource, fraction } => ctx
                .target
                .and_then(|target| sim.unit(target).pool(*resource))
                .map(|pool| (pool.capacity() - pool.current()) * fraction)
                .unwrap_or(0.0),

            Self::Sum(parts) => parts.iter().map(|part| part.evaluate(sim, ctx)).sum(),

            Self::Product(parts) => parts.iter().map(|part| part.evaluate(sim, ctx)).product(),

            Self::Min(parts) => fold_parts(parts, sim, ctx, f64::min),

            Self::Max(parts) => fold_parts(parts, sim, ctx, f64::max),

            Self::Custom(f) => f(sim, ctx),
        }
    }
}

fn fold_parts(
    parts: &[BaseValue],
    sim: &mut Simulation,
    ctx: &BaseContext,
    pick: fn(f64, f64) -> f64,
) -> f64 {
    parts
        .iter()
        .map(|part| part.evaluate(sim, ctx))
        .reduce(pick)
        .unwrap_or(0.0)
}

impl fmt::Debug for BaseValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat(v) => f.debug_tuple("Flat").field(v).finish(),
            Self::Roll { min, max } => f
                .debug_struct("Roll")
                .field("min", min)
                .field("max", max)
                .finish(),
            Self::CasterStat { stat, coefficient } => f
                .debug_struct("CasterStat")
                .field("stat", stat)
                .field("coefficient", coefficient)
                .finish(),
            Self::TargetStat { stat, coefficient } => f
                .debug_struct("TargetStat")
                .field("stat", stat)
                .field("coefficient", coefficient)
                .finish(),
            Self::TargetResource { resource, fraction } => f
                .debug_struct("TargetResource")
                .field("resource", resource)
                .field("fraction", fraction)
                .finish(),
            Self::TargetMissingResource { resource, fraction } => f
                .debug_struct("TargetMissingResource")
                .field("resource", resource)
                .field("fraction", fraction)
                .finish(),
            Self::Sum(parts) => f.debug_tuple("Sum").field(parts).finish(),
            Self::Product(parts) => f.debug_tuple("Product").field(parts).finish(),
            Self::Min(parts) => f.debug_tuple("Min").field(parts).finish(),
            Self::Max(parts) => f.debug_tuple("Max").field(parts).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl From<f64> for BaseValue {
    fn from(value: f64) -> Self {
        Self::Flat(value)
    }
}
