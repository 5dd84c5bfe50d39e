//! Common error infrastructure for combat-core.
//!
//! Shared severity classification, the [`SimError`] trait, configuration errors
//! and the run-time diagnostics counter. Domain-specific refusals
//! (`CastRefusal`, `ResourceError`) live beside the operations that produce
//! them.
//!
//! # Classes of failure
//!
//! - **Configuration**: rejected at registration or [`finalize`]; the run never starts.
//! - **Refusals**: expected run-time outcomes (not enough rage, on cooldown); the
//!   caller decides what to do and the run continues.
//! - **Invariant violations**: a caller asked for something impossible
//!   (negative gain, deactivating an inactive aura). The request is clamped,
//!   logged and counted in [`Diagnostics`]; the run continues.
//!
//! [`finalize`]: crate::Simulation::finalize

use crate::ids::{AuraId, SpellId, UnitId};
use crate::resource::ResourceKind;

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Expected at run time; the caller may retry later or choose another action.
    ///
    /// Examples: insufficient resource, ability on cooldown
    Recoverable,

    /// Invalid input that should not be retried without changes.
    ///
    /// Examples: unknown unit handle, stack bounds out of range
    Validation,

    /// Unexpected state inconsistency inside the engine.
    Internal,

    /// The run cannot start or continue.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all combat-core errors.
///
/// # Implementation Guidelines
///
/// - All error enums implement this trait
/// - Use `#[derive(thiserror::Error)]` for the Display/Error impl
/// - Classify severity by recoverability, not impact
pub trait SimError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static identifier for this error variant.
    ///
    /// Default implementation uses the error type name.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Setup-time failures. A run with any of these must not start.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("unit {0} is not registered")]
    UnknownUnit(UnitId),

    #[error("spell {0} is not registered")]
    UnknownSpell(SpellId),

    #[error("aura {0} is not registered")]
    UnknownAura(AuraId),

    #[error("unit {unit} already carries an aura labelled {label:?}")]
    DuplicateAuraLabel { unit: UnitId, label: &'static str },

    #[error("unit {unit} already has a {kind} pool")]
    DuplicatePool { unit: UnitId, kind: ResourceKind },

    #[error("unit {unit} has no {kind} pool required by {what}")]
    MissingPool {
        unit: UnitId,
        kind: ResourceKind,
        what: &'static str,
    },

    #[error("spell {label:?} produces damage or healing but has no outcome policy")]
    MissingOutcomePolicy { label: &'static str },

    #[error("aura {label:?}: initial stacks {initial} exceed max stacks {max}")]
    InvalidStackBounds {
        label: &'static str,
        initial: u32,
        max: u32,
    },

    #[error("periodic effect {label:?} must have at least one tick and a non-zero tick length")]
    InvalidPeriodic { label: &'static str },

    #[error("unit {unit} exceeds the capacity of {capacity} {what}")]
    CapacityExceeded {
        unit: UnitId,
        what: &'static str,
        capacity: usize,
    },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },

    #[error("the simulation is already finalized")]
    AlreadyFinalized,

    #[error("the simulation must be finalized before it can run")]
    NotFinalized,
}

impl SimError for ConfigError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::AlreadyFinalized | Self::NotFinalized => ErrorSeverity::Fatal,
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownUnit(_) => "CONFIG_UNKNOWN_UNIT",
            Self::UnknownSpell(_) => "CONFIG_UNKNOWN_SPELL",
            Self::UnknownAura(_) => "CONFIG_UNKNOWN_AURA",
            Self::DuplicateAuraLabel { .. } => "CONFIG_DUPLICATE_AURA",
            Self::DuplicatePool { .. } => "CONFIG_DUPLICATE_POOL",
            Self::MissingPool { .. } => "CONFIG_MISSING_POOL",
            Self::MissingOutcomePolicy { .. } => "CONFIG_MISSING_OUTCOME_POLICY",
            Self::InvalidStackBounds { .. } => "CONFIG_INVALID_STACK_BOUNDS",
            Self::InvalidPeriodic { .. } => "CONFIG_INVALID_PERIODIC",
            Self::CapacityExceeded { .. } => "CONFIG_CAPACITY_EXCEEDED",
            Self::InvalidValue { .. } => "CONFIG_INVALID_VALUE",
            Self::AlreadyFinalized => "CONFIG_ALREADY_FINALIZED",
            Self::NotFinalized => "CONFIG_NOT_FINALIZED",
        }
    }
}

/// A request the engine refused and clamped instead of applying.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("negative {kind} amount {amount} requested on unit {unit}")]
    NegativeResourceRequest {
        unit: UnitId,
        kind: ResourceKind,
        amount: f64,
    },

    #[error("aura {0} deactivated while already inactive")]
    DoubleDeactivation(AuraId),

    #[error("aura {aura} asked for {requested} stacks, max is {max}")]
    StackOutOfBounds {
        aura: AuraId,
        requested: u32,
        max: u32,
    },

    #[error("proc chain exceeded depth {0}; callbacks skipped")]
    ProcDepthExceeded(u32),
}

impl SimError for InvariantViolation {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NegativeResourceRequest { .. } => "INVARIANT_NEGATIVE_RESOURCE",
            Self::DoubleDeactivation(_) => "INVARIANT_DOUBLE_DEACTIVATION",
            Self::StackOutOfBounds { .. } => "INVARIANT_STACK_OUT_OF_BOUNDS",
            Self::ProcDepthExceeded(_) => "INVARIANT_PROC_DEPTH",
        }
    }
}

/// Run-time counter of invariant violations.
///
/// Violations never abort a run; they are logged and tallied here so tests and
/// reporting collaborators can assert on them.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    violations: u64,
    last: Option<InvariantViolation>,
}

impl Diagnostics {
    pub fn record(&mut self, violation: InvariantViolation) {
        tracing::warn!(
            code = violation.error_code(),
            "invariant violation: {violation}"
        );
        self.violations += 1;
        self.last = Some(violation);
    }

    pub fn violations(&self) -> u64 {
        self.violations
    }

    pub fn last(&self) -> Option<&InvariantViolation> {
        self.last.as_ref()
    }

    pub fn is_clean(&self) -> bool {
        self.violations == 0
    }
}
