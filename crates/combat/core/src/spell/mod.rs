//! Abilities: immutable definitions plus their run-time cast, cooldown and
//! metrics state.
//!
//! The cast state machine per unit:
//!
//! ```text
//! Idle ──try_cast──▶ Casting ──completion──▶ Idle
//!                       │                 └─▶ Channeling ──end──▶ Idle
//!                       └──interrupt──▶ Idle
//! ```
//!
//! Every transition bumps the unit's cast token; pending completion and
//! channel-end events carry the token they were scheduled with and no-op when
//! it went stale.

mod cast;
mod config;
mod cooldown;

pub use config::{
    CastConfig, CooldownConfig, Cost, CostTiming, EffectTemplate, FollowUp, ProcMask, SpellConfig,
    SpellEffect, SpellFlags, SpellFn,
};
pub use cooldown::CooldownState;

use std::sync::Arc;
use std::time::Duration;

use crate::error::{ErrorSeverity, SimError};
use crate::ids::{SpellId, UnitId};
use crate::metrics::SpellMetrics;
use crate::resource::ResourceKind;
use crate::time::SimTime;

/// Registered ability with its run-time state.
#[derive(Debug)]
pub struct Spell {
    pub(crate) id: SpellId,
    pub(crate) config: Arc<SpellConfig>,
    pub(crate) cooldown: CooldownState,
    /// Indexed by target unit; sized when the simulation is finalized.
    pub(crate) metrics: Vec<SpellMetrics>,
}

impl Spell {
    pub(crate) fn new(id: SpellId, config: SpellConfig) -> Self {
        Self {
            id,
            cooldown: CooldownState::new(config.cast.cooldown),
            config: Arc::new(config),
            metrics: Vec::new(),
        }
    }

    pub fn id(&self) -> SpellId {
        self.id
    }

    pub fn config(&self) -> &SpellConfig {
        &self.config
    }

    /// Charge state as last written; query through
    /// [`Simulation::charges`](crate::sim::Simulation::charges) for the value at the current time.
    pub fn cooldown(&self) -> &CooldownState {
        &self.cooldown
    }

    /// This iteration's counters against `target`.
    pub fn metrics(&self, target: UnitId) -> Option<&SpellMetrics> {
        self.metrics.get(target.index())
    }

    pub(crate) fn metrics_mut(&mut self, target: UnitId) -> &mut SpellMetrics {
        let index = target.index();
        if self.metrics.len() <= index {
            self.metrics.resize(index + 1, SpellMetrics::default());
        }
        &mut self.metrics[index]
    }
}

/// Phase of a unit's cast state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CastPhase {
    #[default]
    Idle,
    Casting {
        spell: SpellId,
        target: UnitId,
        completes_at: SimTime,
    },
    Channeling {
        spell: SpellId,
        ends_at: SimTime,
    },
}

/// Per-unit cast bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CastState {
    pub phase: CastPhase,
    pub gcd_ready_at: SimTime,
    pub(crate) token: u64,
}

impl CastState {
    /// Casting or channeling. The global cooldown is tracked separately in
    /// `gcd_ready_at`.
    pub fn is_busy(&self) -> bool {
        !matches!(self.phase, CastPhase::Idle)
    }

    pub(crate) fn reset(&mut self) {
        self.phase = CastPhase::Idle;
        self.gcd_ready_at = SimTime::ZERO;
        self.token += 1;
    }
}

/// Why a cast request was refused.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CastRefusal {
    #[error("caster is busy until {until}")]
    Busy { until: SimTime },

    #[error("global cooldown ready at {ready_at}")]
    OnGlobalCooldown { ready_at: SimTime },

    #[error("on cooldown for another {remaining:?}")]
    OnCooldown { remaining: Duration },

    #[error("not enough {kind}: need {required}, have {available}")]
    InsufficientResource {
        kind: ResourceKind,
        required: f64,
        available: f64,
    },

    #[error("target {0} is not registered")]
    InvalidTarget(UnitId),

    #[error("spell {0} is not registered")]
    UnknownSpell(SpellId),

    #[error("the simulation is not finalized")]
    NotReady,
}

impl SimError for CastRefusal {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidTarget(_) | Self::UnknownSpell(_) | Self::NotReady => {
                ErrorSeverity::Validation
            }
            _ => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Busy { .. } => "CAST_BUSY",
            Self::OnGlobalCooldown { .. } => "CAST_ON_GCD",
            Self::OnCooldown { .. } => "CAST_ON_COOLDOWN",
            Self::InsufficientResource { .. } => "CAST_INSUFFICIENT_RESOURCE",
            Self::InvalidTarget(_) => "CAST_INVALID_TARGET",
            Self::UnknownSpell(_) => "CAST_UNKNOWN_SPELL",
            Self::NotReady => "CAST_NOT_READY",
        }
    }
}
