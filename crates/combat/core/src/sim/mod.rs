//! The simulation: combatant graph, clock and random streams of one run.
//!
//! All mutation happens inside scheduler callbacks (or direct calls from the
//! driver between `advance` calls); there is no locking. Independent runs are
//! parallelized by building one `Simulation` per worker (see [`batch`]).

#[cfg(feature = "parallel")]
pub mod batch;
mod run;
mod unit;

pub use unit::{Unit, UnitConfig, UnitKind};

use std::sync::Arc;
use std::time::Duration;

use crate::aura::{Aura, AuraConfig, ExclusiveSlot};
use crate::config::SimConfig;
use crate::error::{ConfigError, Diagnostics, InvariantViolation};
use crate::ids::{ActionId, AuraId, SpellId, UnitId};
use crate::metrics::{AggregateMetrics, SpellMetrics};
use crate::resource::{ResourceError, ResourceKind, ResourcePool};
use crate::rng::RngStreams;
use crate::scheduler::{self, HasScheduler, Scheduler};
use crate::spell::{Spell, SpellConfig};
use crate::time::SimTime;

/// Callback run at the start of every iteration (rotation drivers, scripted
/// encounter events).
pub type SimFn = Arc<dyn Fn(&mut Simulation) + Send + Sync>;

/// Encounter-wide state of the current iteration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Encounter {
    /// Damage taken by all enemy units this iteration.
    pub damage_taken: f64,
}

pub struct Simulation {
    config: Arc<SimConfig>,
    scheduler: Scheduler<Simulation>,
    units: Vec<Unit>,
    rng: RngStreams,
    diagnostics: Diagnostics,
    encounter: Encounter,
    aggregate: AggregateMetrics,
    iteration_hooks: Vec<SimFn>,
    iteration: u64,
    finalized: bool,
    proc_depth: u32,
    next_effect_id: u64,
}

impl HasScheduler for Simulation {
    fn scheduler(&self) -> &Scheduler<Self> {
        &self.scheduler
    }

    fn scheduler_mut(&mut self) -> &mut Scheduler<Self> {
        &mut self.scheduler
    }
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        Self::with_shared_config(Arc::new(config))
    }

    /// Builds a run around configuration shared with other runs.
    pub fn with_shared_config(config: Arc<SimConfig>) -> Self {
        let seed = config.iteration_seed(0);
        Self {
            config,
            scheduler: Scheduler::new(),
            units: Vec::new(),
            rng: RngStreams::new(seed),
            diagnostics: Diagnostics::default(),
            encounter: Encounter::default(),
            aggregate: AggregateMetrics::default(),
            iteration_hooks: Vec::new(),
            iteration: 0,
            finalized: false,
            proc_depth: 0,
            next_effect_id: 0,
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    fn ensure_open(&self) -> Result<(), ConfigError> {
        if self.finalized {
            Err(ConfigError::AlreadyFinalized)
        } else {
            Ok(())
        }
    }

    fn check_unit(&self, unit: UnitId) -> Result<(), ConfigError> {
        if unit.index() < self.units.len() {
            Ok(())
        } else {
            Err(ConfigError::UnknownUnit(unit))
        }
    }

    pub(crate) fn check_spell(&self, spell: SpellId) -> Result<(), ConfigError> {
        self.check_unit(spell.unit)?;
        if spell.slot() < self.units[spell.unit.index()].spells.len() {
            Ok(())
        } else {
            Err(ConfigError::UnknownSpell(spell))
        }
    }

    pub(crate) fn check_aura(&self, aura: AuraId) -> Result<(), ConfigError> {
        self.check_unit(aura.unit)?;
        if aura.slot() < self.units[aura.unit.index()].auras.len() {
            Ok(())
        } else {
            Err(ConfigError::UnknownAura(aura))
        }
    }

    /// Adds a combatant. Ids are dense and assigned in registration order.
    pub fn add_unit(&mut self, config: UnitConfig) -> Result<UnitId, ConfigError> {
        self.ensure_open()?;
        if self.units.len() >= SimConfig::MAX_UNITS {
            return Err(ConfigError::CapacityExceeded {
                unit: UnitId(self.units.len() as u16),
                what: "units",
                capacity: SimConfig::MAX_UNITS,
            });
        }
        let id = UnitId(self.units.len() as u16);
        self.units.push(Unit::new(id, config));
        Ok(id)
    }

    /// Gives `unit` a resource pool. A unit holds at most one pool per kind.
    pub fn add_pool(&mut self, unit: UnitId, pool: ResourcePool) -> Result<(), ConfigError> {
        self.ensure_open()?;
        self.check_unit(unit)?;
        let owner = &mut self.units[unit.index()];
        if owner.pool(pool.kind()).is_some() {
            return Err(ConfigError::DuplicatePool {
                unit,
                kind: pool.kind(),
            });
        }
        owner
            .pools
            .try_push(pool)
            .map_err(|_| ConfigError::CapacityExceeded {
                unit,
                what: "resource pools",
                capacity: SimConfig::MAX_POOLS,
            })
    }

    /// Registers an inactive aura on `unit`.
    ///
    /// Labels are unique per unit. Exclusive categories take a slot on the
    /// unit at registration.
    pub fn register_aura(&mut self, unit: UnitId, config: AuraConfig) -> Result<AuraId, ConfigError> {
        self.ensure_open()?;
        self.check_unit(unit)?;
        if config.initial_stacks > config.max_stacks {
            return Err(ConfigError::InvalidStackBounds {
                label: config.label,
                initial: config.initial_stacks,
                max: config.max_stacks,
            });
        }
        let owner = &mut self.units[unit.index()];
        if owner.find_aura(config.label).is_some() {
            return Err(ConfigError::DuplicateAuraLabel {
                unit,
                label: config.label,
            });
        }
        if let Some(category) = config.category {
            if !owner.exclusive.iter().any(|slot| slot.category == category) {
                owner
                    .exclusive
                    .try_push(ExclusiveSlot {
                        category,
                        holder: None,
                    })
                    .map_err(|_| ConfigError::CapacityExceeded {
                        unit,
                        what: "exclusive aura categories",
                        capacity: SimConfig::MAX_EXCLUSIVE_CATEGORIES,
                    })?;
            }
        }
        let id = AuraId::new(unit, owner.auras.len() as u16);
        owner.auras.push(Aura::new(id, config));
        Ok(id)
    }

    /// Registers an ability on `unit`.
    ///
    /// A cost needs the matching pool to be registered first, and an aura
    /// effect must name an aura that already exists.
    pub fn register_spell(&mut self, unit: UnitId, config: SpellConfig) -> Result<SpellId, ConfigError> {
        self.ensure_open()?;
        self.check_unit(unit)?;
        config.validate()?;
        if let Some(cost) = config.cast.cost {
            if self.units[unit.index()].pool(cost.kind).is_none() {
                return Err(ConfigError::MissingPool {
                    unit,
                    kind: cost.kind,
                    what: config.label,
                });
            }
        }
        if let crate::spell::SpellEffect::ActivateAura(aura) = config.effect {
            self.check_aura(aura)?;
        }
        let owner = &mut self.units[unit.index()];
        let id = SpellId::new(unit, owner.spells.len() as u16);
        owner.spells.push(Spell::new(id, config));
        Ok(id)
    }

    /// Registers a callback run at the start of every iteration.
    pub fn add_iteration_hook(&mut self, hook: impl Fn(&mut Simulation) + Send + Sync + 'static) {
        self.iteration_hooks.push(Arc::new(hook));
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Handle for building sibling simulations on the same configuration.
    pub fn shared_config(&self) -> Arc<SimConfig> {
        Arc::clone(&self.config)
    }

    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Queued events, stale guarded ones included.
    pub fn pending_events(&self) -> usize {
        self.scheduler.len()
    }

    pub fn scheduler_stats(&self) -> scheduler::SchedulerStats {
        self.scheduler.stats()
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// # Panics
    ///
    /// Panics if `id` was not returned by [`add_unit`](Self::add_unit).
    pub fn unit(&self, id: UnitId) -> &Unit {
        &self.units[id.index()]
    }

    /// # Panics
    ///
    /// Panics if `id` was not returned by [`add_unit`](Self::add_unit).
    pub fn unit_mut(&mut self, id: UnitId) -> &mut Unit {
        &mut self.units[id.index()]
    }

    pub fn spell(&self, id: SpellId) -> &Spell {
        &self.units[id.unit.index()].spells[id.slot()]
    }

    pub(crate) fn spell_mut(&mut self, id: SpellId) -> &mut Spell {
        &mut self.units[id.unit.index()].spells[id.slot()]
    }

    pub(crate) fn spell_config(&self, id: SpellId) -> Arc<SpellConfig> {
        Arc::clone(&self.spell(id).config)
    }

    pub fn aura(&self, id: AuraId) -> &Aura {
        &self.units[id.unit.index()].auras[id.slot()]
    }

    pub(crate) fn aura_mut(&mut self, id: AuraId) -> &mut Aura {
        &mut self.units[id.unit.index()].auras[id.slot()]
    }

    /// Current-iteration metrics of `spell` against `target`.
    /// This iteration's counters of `spell` against `target`; all zero when it
    /// has not touched the target yet.
    pub fn spell_metrics(&self, spell: SpellId, target: UnitId) -> SpellMetrics {
        self.spell(spell)
            .metrics(target)
            .copied()
            .unwrap_or_default()
    }

    /// Current value of `unit`'s `kind` pool, `None` when it has none.
    pub fn resource(&self, unit: UnitId, kind: ResourceKind) -> Option<f64> {
        self.unit(unit).pool(kind).map(ResourcePool::current)
    }

    pub fn pool(&self, unit: UnitId, kind: ResourceKind) -> Option<&ResourcePool> {
        self.unit(unit).pool(kind)
    }

    /// Time until `spell` has a charge available; zero when it is ready or has
    /// no cooldown.
    pub fn time_to_ready(&self, spell: SpellId) -> Duration {
        self.spell(spell).cooldown.time_to_ready(self.now())
    }

    /// Charges of `spell` available now, counting recharges that have elapsed.
    /// Abilities without a cooldown report zero.
    pub fn charges(&self, spell: SpellId) -> u32 {
        self.spell(spell).cooldown.charges(self.now())
    }

    /// Whether `unit` is mid-cast or channeling. The global cooldown alone does
    /// not count.
    pub fn is_casting(&self, unit: UnitId) -> bool {
        self.unit(unit).cast.is_busy()
    }

    /// Invariant violations recorded so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub(crate) fn record_violation(&mut self, violation: InvariantViolation) {
        self.diagnostics.record(violation);
    }

    /// Encounter-wide state of the running iteration.
    pub fn encounter(&self) -> &Encounter {
        &self.encounter
    }

    pub(crate) fn encounter_mut(&mut self) -> &mut Encounter {
        &mut self.encounter
    }

    /// Metrics of every iteration finished so far.
    pub fn aggregate(&self) -> &AggregateMetrics {
        &self.aggregate
    }

    pub fn into_aggregate(self) -> AggregateMetrics {
        self.aggregate
    }

    /// Named random streams, reseeded at the start of every iteration.
    pub fn rng_mut(&mut self) -> &mut RngStreams {
        &mut self.rng
    }

    pub(crate) fn log_events(&self) -> bool {
        self.config.log_events
    }

    /// Units hostile to `unit`, in registration order.
    pub fn enemies_of(&self, unit: UnitId) -> Vec<UnitId> {
        let kind = self.unit(unit).kind;
        self.units
            .iter()
            .filter(|other| other.kind.is_hostile_to(kind))
            .map(|other| other.id)
            .collect()
    }

    // ========================================================================
    // Scheduling
    // ========================================================================

    /// Enqueues a driver event.
    ///
    /// # Panics
    ///
    /// Panics if `at` is earlier than the current time.
    pub fn schedule(
        &mut self,
        at: SimTime,
        label: &'static str,
        callback: impl FnOnce(&mut Simulation) + 'static,
    ) {
        self.scheduler.schedule(at, label, callback);
    }

    /// Enqueues a driver event `delay` after the current time.
    pub fn schedule_in(
        &mut self,
        delay: Duration,
        label: &'static str,
        callback: impl FnOnce(&mut Simulation) + 'static,
    ) {
        self.scheduler.schedule_in(delay, label, callback);
    }

    pub(crate) fn schedule_guarded(
        &mut self,
        at: SimTime,
        label: &'static str,
        is_live: impl Fn(&Simulation) -> bool + 'static,
        callback: impl FnOnce(&mut Simulation) + 'static,
    ) {
        self.scheduler.schedule_guarded(at, label, is_live, callback);
    }

    /// Fires due events up to `horizon`; returns how many fired.
    pub fn advance(&mut self, horizon: SimTime) -> usize {
        scheduler::advance(self, horizon)
    }

    pub fn advance_by(&mut self, duration: Duration) -> usize {
        let horizon = self.now() + duration;
        self.advance(horizon)
    }

    pub(crate) fn next_effect_id(&mut self) -> u64 {
        self.next_effect_id += 1;
        self.next_effect_id
    }

    pub(crate) fn enter_proc(&mut self) -> bool {
        self.proc_depth += 1;
        if self.proc_depth > self.config.max_proc_depth {
            self.record_violation(InvariantViolation::ProcDepthExceeded(self.config.max_proc_depth));
            false
        } else {
            true
        }
    }

    pub(crate) fn leave_proc(&mut self) {
        self.proc_depth = self.proc_depth.saturating_sub(1);
    }

    // ========================================================================
    // Resources
    // ========================================================================

    fn checked_pool(&mut self, unit: UnitId, kind: ResourceKind) -> Result<&mut ResourcePool, ResourceError> {
        self.units[unit.index()]
            .pool_mut(kind)
            .ok_or(ResourceError::MissingPool(kind))
    }

    fn note_resource_error(&mut self, unit: UnitId, err: &ResourceError) {
        if let ResourceError::NegativeAmount { kind, amount } = *err {
            self.record_violation(InvariantViolation::NegativeResourceRequest { unit, kind, amount });
        }
    }

    /// Adds to a pool, clamped at capacity; returns the realized gain.
    ///
    /// Negative amounts are refused and counted as invariant violations.
    pub fn gain_resource(
        &mut self,
        unit: UnitId,
        kind: ResourceKind,
        amount: f64,
        source: ActionId,
    ) -> Result<f64, ResourceError> {
        let result = self.checked_pool(unit, kind)?.gain(amount, source);
        match &result {
            Ok(realized) => {
                if self.log_events() {
                    tracing::debug!(time = %self.now(), %unit, %kind, amount, realized, %source, "resource gained");
                }
            }
            Err(err) => self.note_resource_error(unit, err),
        }
        result
    }

    /// Removes from a pool; hard pools refuse overspending, soft pools clamp.
    pub fn spend_resource(
        &mut self,
        unit: UnitId,
        kind: ResourceKind,
        amount: f64,
        source: ActionId,
    ) -> Result<f64, ResourceError> {
        let result = self.checked_pool(unit, kind)?.spend(amount, source);
        match &result {
            Ok(realized) => {
                if self.log_events() {
                    tracing::debug!(time = %self.now(), %unit, %kind, amount, realized, %source, "resource spent");
                }
            }
            Err(err) => self.note_resource_error(unit, err),
        }
        result
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("now", &self.now())
            .field("iteration", &self.iteration)
            .field("units", &self.units.len())
            .field("scheduler", &self.scheduler)
            .field("finalized", &self.finalized)
            .finish_non_exhaustive()
    }
}
