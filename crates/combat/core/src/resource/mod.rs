//! Resource pools: bounded scalars with clamped gain/spend and per-source
//! accounting.
//!
//! Pools are owned by units and addressed by [`ResourceKind`]. The simulation
//! wraps pool operations so refused negative requests are counted as invariant
//! violations; the pool itself only reports them.

mod ledger;
mod pool;
pub mod rage;
mod regen;

pub use ledger::{FlowTotals, ResourceLedger, SourceFlow};
pub use pool::{PoolKind, Regeneration, ResourcePool};
pub use rage::RageBarOptions;

use crate::error::{ErrorSeverity, SimError};

/// Resource types a combatant may carry.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumCount,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResourceKind {
    Health,
    Mana,
    Rage,
    Energy,
    RunicPower,
    Focus,
    ComboPoints,
}

/// Refused pool operations.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ResourceError {
    #[error("negative {kind} amount {amount} refused")]
    NegativeAmount { kind: ResourceKind, amount: f64 },

    #[error("not enough {kind}: requested {requested}, available {available}")]
    Insufficient {
        kind: ResourceKind,
        requested: f64,
        available: f64,
    },

    #[error("unit has no {0} pool")]
    MissingPool(ResourceKind),
}

impl SimError for ResourceError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Insufficient { .. } => ErrorSeverity::Recoverable,
            Self::NegativeAmount { .. } => ErrorSeverity::Internal,
            Self::MissingPool(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NegativeAmount { .. } => "RESOURCE_NEGATIVE_AMOUNT",
            Self::Insufficient { .. } => "RESOURCE_INSUFFICIENT",
            Self::MissingPool(_) => "RESOURCE_MISSING_POOL",
        }
    }
}
