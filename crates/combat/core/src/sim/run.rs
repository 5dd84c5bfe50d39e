//! Iteration lifecycle: finalize, run, fold metrics, reset.

use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::ids::{ActionId, UnitId};
use crate::metrics::{AggregateMetrics, ResourceIteration, SpellMetrics, UnitIteration};
use crate::outcome::AttackTable;
use crate::resource::ResourcePool;
use crate::time::SimTime;

use super::Simulation;

/// This iteration's realized flow of a pool, one entry per source.
fn resource_flows(pool: &ResourcePool) -> BTreeMap<ActionId, ResourceIteration> {
    let mut flows: BTreeMap<ActionId, ResourceIteration> = BTreeMap::new();
    for (source, flow) in pool.ledger().gains() {
        flows.entry(source).or_default().gained += flow.current.realized;
    }
    for (source, flow) in pool.ledger().spends() {
        flows.entry(source).or_default().spent += flow.current.realized;
    }
    flows
}

impl Simulation {
    /// Closes registration, builds the attack tables and starts iteration 0.
    ///
    /// Configuration problems are reported here and the run must not start.
    pub fn finalize(&mut self) -> Result<(), ConfigError> {
        if self.finalized {
            return Err(ConfigError::AlreadyFinalized);
        }
        self.config.validate()?;

        let tables: Vec<Vec<AttackTable>> = self
            .units
            .iter()
            .map(|attacker| {
                self.units
                    .iter()
                    .map(|defender| {
                        AttackTable::new(
                            attacker.level,
                            attacker.kind.is_player_side(),
                            defender.level,
                            defender.kind.is_player_side(),
                            &self.config,
                        )
                    })
                    .collect()
            })
            .collect();
        let unit_count = self.units.len();
        for (unit, tables) in self.units.iter_mut().zip(tables) {
            unit.attack_tables = tables;
            for spell in &mut unit.spells {
                spell.metrics = vec![SpellMetrics::default(); unit_count];
            }
        }

        self.finalized = true;
        tracing::debug!(units = unit_count, seed = self.config.base_seed, "simulation finalized");
        self.reset_state();
        self.begin_iteration();
        Ok(())
    }

    /// Runs the current iteration to its duration, folds its metrics and
    /// prepares the next one.
    pub fn run_iteration(&mut self) -> Result<(), ConfigError> {
        if !self.finalized {
            return Err(ConfigError::NotFinalized);
        }
        let horizon = SimTime::ZERO + self.config.duration;
        let fired = self.advance(horizon);
        tracing::trace!(iteration = self.iteration, fired, "iteration finished");

        self.end_iteration();
        self.reset_state();
        self.begin_iteration();
        Ok(())
    }

    pub fn run_iterations(&mut self, iterations: u64) -> Result<&AggregateMetrics, ConfigError> {
        for _ in 0..iterations {
            self.run_iteration()?;
        }
        Ok(&self.aggregate)
    }

    /// Restarts at `iteration`, discarding the state of the current one.
    ///
    /// Lets batch workers reproduce the seeds of a sequential run.
    pub fn skip_to_iteration(&mut self, iteration: u64) -> Result<(), ConfigError> {
        if !self.finalized {
            return Err(ConfigError::NotFinalized);
        }
        self.expire_all_auras();
        self.iteration = iteration;
        self.reset_state();
        self.begin_iteration();
        Ok(())
    }

    fn end_iteration(&mut self) {
        self.expire_all_auras();

        let seconds = self.config.duration.as_secs_f64();
        for unit in &mut self.units {
            let mut totals = UnitIteration::default();
            // Gain threat depends on this iteration's spell damage.
            for pool in &unit.pools {
                for (source, flow) in resource_flows(pool) {
                    let threat = if unit.gain_generates_threat(source) {
                        flow.gained * pool.threat_per_unit_gained()
                    } else {
                        0.0
                    };
                    totals.threat += threat;
                    self.aggregate
                        .push_resource((unit.id, pool.kind(), source), ResourceIteration { threat, ..flow });
                }
            }
            unit.pools.iter_mut().for_each(|pool| pool.done_iteration());
            for spell in &mut unit.spells {
                for (target, metrics) in spell.metrics.iter_mut().enumerate() {
                    totals.damage += metrics.total_damage;
                    totals.healing += metrics.total_healing;
                    totals.threat += metrics.total_threat;
                    self.aggregate.push_spell(spell.id, UnitId(target as u16), metrics);
                    *metrics = SpellMetrics::default();
                }
            }
            self.aggregate.push_unit(unit.id, totals, seconds);
        }
        self.aggregate.finish_iteration(self.encounter.damage_taken);
        self.iteration += 1;
    }

    /// Returns every unit to its starting state. Anything recorded since the
    /// last fold (e.g. by iteration hooks before a skip) is dropped.
    fn reset_state(&mut self) {
        self.scheduler.clear();
        self.rng.reseed(self.config.iteration_seed(self.iteration));
        for unit in &mut self.units {
            for pool in &mut unit.pools {
                pool.reset();
                pool.discard_iteration();
            }
            unit.cast.reset();
            for spell in &mut unit.spells {
                spell.cooldown.reset();
                spell.metrics.fill(SpellMetrics::default());
            }
            unit.dots.iter_mut().for_each(|dot| dot.reset());
        }
        self.proc_depth = 0;
        self.encounter = Default::default();
    }

    fn begin_iteration(&mut self) {
        self.run_aura_reset_hooks();
        self.start_regeneration();
        let hooks = self.iteration_hooks.clone();
        for hook in hooks {
            hook(self);
        }
    }
}
