use std::time::Duration;

use super::ledger::ResourceLedger;
use super::{ResourceError, ResourceKind};
use crate::ids::ActionId;

/// How a pool treats a spend larger than its current value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PoolKind {
    /// Refuses the spend (mana, energy, rage costs).
    Hard,
    /// Clamps at zero (health taking damage).
    Soft,
}

/// Passive regeneration: `amount` every `interval`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Regeneration {
    pub amount: f64,
    pub interval: Duration,
}

/// Bounded scalar resource with per-source accounting.
///
/// After every operation `0 <= current <= capacity`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourcePool {
    kind: ResourceKind,
    pool_kind: PoolKind,
    capacity: f64,
    starting: f64,
    current: f64,
    threat_per_unit_gained: f64,
    regen: Option<Regeneration>,
    ledger: ResourceLedger,
}

impl ResourcePool {
    /// Creates a full pool.
    pub fn new(kind: ResourceKind, pool_kind: PoolKind, capacity: f64) -> Self {
        let capacity = capacity.max(0.0);
        Self {
            kind,
            pool_kind,
            capacity,
            starting: capacity,
            current: capacity,
            threat_per_unit_gained: 0.0,
            regen: None,
            ledger: ResourceLedger::default(),
        }
    }

    /// Value the pool returns to on every iteration reset (clamped to capacity).
    #[must_use]
    pub fn with_starting(mut self, starting: f64) -> Self {
        self.starting = starting.clamp(0.0, self.capacity);
        self.current = self.starting;
        self
    }

    #[must_use]
    pub fn with_threat_per_unit_gained(mut self, threat: f64) -> Self {
        self.threat_per_unit_gained = threat;
        self
    }

    #[must_use]
    pub fn with_regen(mut self, amount: f64, interval: Duration) -> Self {
        self.regen = Some(Regeneration { amount, interval });
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn pool_kind(&self) -> PoolKind {
        self.pool_kind
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn starting(&self) -> f64 {
        self.starting
    }

    pub fn regen(&self) -> Option<Regeneration> {
        self.regen
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn can_afford(&self, amount: f64) -> bool {
        self.current >= amount
    }

    /// Adds up to `amount`, clamped at capacity.
    ///
    /// Returns the realized gain. Negative amounts are refused and leave the
    /// pool untouched.
    pub fn gain(&mut self, amount: f64, source: ActionId) -> Result<f64, ResourceError> {
        if !(amount >= 0.0) {
            return Err(ResourceError::NegativeAmount {
                kind: self.kind,
                amount,
            });
        }
        let realized = amount.min(self.capacity - self.current);
        self.current += realized;
        self.ledger.record_gain(source, amount, realized);
        Ok(realized)
    }

    /// Removes `amount`.
    ///
    /// Hard pools refuse a spend larger than the current value; soft pools
    /// clamp at zero. Returns the realized spend.
    pub fn spend(&mut self, amount: f64, source: ActionId) -> Result<f64, ResourceError> {
        if !(amount >= 0.0) {
            return Err(ResourceError::NegativeAmount {
                kind: self.kind,
                amount,
            });
        }
        let realized = match self.pool_kind {
            PoolKind::Hard if amount > self.current => {
                return Err(ResourceError::Insufficient {
                    kind: self.kind,
                    requested: amount,
                    available: self.current,
                });
            }
            PoolKind::Hard => amount,
            PoolKind::Soft => amount.min(self.current),
        };
        self.current = (self.current - realized).max(0.0);
        self.ledger.record_spend(source, amount, realized);
        Ok(realized)
    }

    /// Threat attributed to resource gains, for pools that generate threat.
    ///
    /// Sources that already carry their own threat (damage dealt by an ability,
    /// damage taken, refunds) are excluded by the caller through `include`.
    pub fn threat_from_gains(&self, include: impl Fn(ActionId) -> bool) -> f64 {
        if self.threat_per_unit_gained == 0.0 {
            return 0.0;
        }
        self.ledger
            .gains()
            .filter(|(source, _)| include(*source))
            .map(|(_, flow)| flow.current.realized)
            .sum::<f64>()
            * self.threat_per_unit_gained
    }

    /// Restores the starting value. Accounting is folded separately.
    pub fn reset(&mut self) {
        self.current = self.starting;
    }

    /// Folds this iteration's accounting into the cumulative totals.
    pub fn done_iteration(&mut self) {
        self.ledger.done_iteration();
    }

    /// Drops this iteration's accounting.
    pub fn discard_iteration(&mut self) {
        self.ledger.discard_iteration();
    }

    pub fn threat_per_unit_gained(&self) -> f64 {
        self.threat_per_unit_gained
    }
}
