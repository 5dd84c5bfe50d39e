use std::sync::Arc;

use super::{Dot, DotConfig, SnapshotMode};
use crate::aura::AuraConfig;
use crate::effect::{BaseContext, Delivery, InstanceSpec, ModifierMode};
use crate::error::ConfigError;
use crate::ids::{DotId, SpellId, UnitId};
use crate::sim::Simulation;

impl Simulation {
    /// Registers `spell`'s periodic effect on `target`.
    ///
    /// The dot's aura is registered on the target, so two casters putting a
    /// dot with the same label on one target need distinct labels.
    pub fn register_dot(
        &mut self,
        spell: SpellId,
        target: UnitId,
        config: DotConfig,
    ) -> Result<DotId, ConfigError> {
        if self.is_finalized() {
            return Err(ConfigError::AlreadyFinalized);
        }
        self.check_spell(spell)?;
        if config.ticks == 0 || config.tick_length.is_zero() {
            return Err(ConfigError::InvalidPeriodic {
                label: config.aura.label,
            });
        }
        if target.index() >= self.units().len() {
            return Err(ConfigError::UnknownUnit(target));
        }

        let aura = self.register_aura(
            target,
            AuraConfig {
                duration: None,
                ..config.aura.clone()
            },
        )?;
        let caster = self.unit_mut(spell.unit);
        let id = DotId::new(spell.unit, caster.dots.len() as u16);
        caster.dots.push(Dot {
            id,
            spell,
            target,
            aura,
            config: Arc::new(config),
            remaining: 0,
            epoch: 0,
            snapshot: None,
        });
        Ok(id)
    }

    pub fn dot(&self, id: DotId) -> &Dot {
        &self.unit(id.unit).dots[id.slot()]
    }

    fn dot_mut(&mut self, id: DotId) -> &mut Dot {
        &mut self.unit_mut(id.unit).dots[id.slot()]
    }

    /// The periodic effect `spell` keeps on `target`, if one was registered.
    pub fn find_dot(&self, spell: SpellId, target: UnitId) -> Option<DotId> {
        self.unit(spell.unit)
            .dots
            .iter()
            .find(|dot| dot.spell == spell && dot.target == target)
            .map(|dot| dot.id)
    }

    pub fn is_dot_active(&self, id: DotId) -> bool {
        self.is_aura_active(self.dot(id).aura)
    }

    /// Applies with a fresh snapshot, replacing any ticks still pending.
    pub fn apply_dot(&mut self, id: DotId) {
        let dot = self.dot(id);
        let (spell, target, config) = (dot.spell, dot.target, Arc::clone(&dot.config));
        let snapshot = match config.mode {
            SnapshotMode::Snapshot => Some(self.take_snapshot(spell, target, &config.base, config.outcome, config.healing)),
            SnapshotMode::Live => None,
        };

        let dot = self.dot_mut(id);
        dot.remaining = config.ticks;
        dot.epoch += 1;
        dot.snapshot = snapshot;
        let aura = dot.aura;

        self.activate_aura(aura);
        self.schedule_ticks(id);
        if self.log_events() {
            tracing::debug!(time = %self.now(), dot = %id, target = %target, label = config.aura.label, "dot applied");
        }
    }

    /// Restarts the tick count without taking a new snapshot.
    ///
    /// Behaves like [`apply_dot`](Self::apply_dot) when the dot is not active.
    pub fn rollover_dot(&mut self, id: DotId) {
        if !self.is_dot_active(id) {
            self.apply_dot(id);
            return;
        }
        let dot = self.dot_mut(id);
        dot.remaining = dot.config.ticks;
        dot.epoch += 1;
        let aura = dot.aura;

        self.refresh_aura(aura);
        self.schedule_ticks(id);
        if self.log_events() {
            tracing::debug!(time = %self.now(), dot = %id, "dot rolled over");
        }
    }

    /// Drops pending ticks and deactivates the aura. Returns false when the
    /// dot was not active.
    pub fn cancel_dot(&mut self, id: DotId) -> bool {
        let dot = self.dot_mut(id);
        dot.remaining = 0;
        dot.epoch += 1;
        let aura = dot.aura;
        if !self.is_aura_active(aura) {
            return false;
        }
        self.deactivate_aura(aura);
        true
    }

    /// Schedules the pending ticks and moves the aura's expiry to the last
    /// one. The final tick deactivates the aura itself, so extending a dot's
    /// aura delays its expiry without adding ticks.
    fn schedule_ticks(&mut self, id: DotId) {
        let dot = self.dot(id);
        let (epoch, aura, ticks, length) = (dot.epoch, dot.aura, dot.remaining, dot.config.tick_length);
        let aura_epoch = self.aura(aura).epoch;
        let start = self.now();
        self.aura_mut(aura).expires_at = start + length * ticks;
        for k in 1..=ticks {
            self.schedule_guarded(
                start + length * k,
                "dot tick",
                move |sim| {
                    let state = sim.aura(aura);
                    sim.dot(id).epoch == epoch && state.is_active() && state.epoch == aura_epoch
                },
                move |sim| sim.tick_dot(id),
            );
        }
    }

    fn tick_dot(&mut self, id: DotId) {
        let dot = self.dot_mut(id);
        dot.remaining = dot.remaining.saturating_sub(1);
        let (spell, target, aura, epoch, snapshot) = (dot.spell, dot.target, dot.aura, dot.epoch, dot.snapshot);
        let config = Arc::clone(&dot.config);

        let (base, mode) = match snapshot {
            Some(snapshot) => (snapshot.base, ModifierMode::Snapshot(snapshot)),
            None => {
                let ctx = BaseContext {
                    actor: spell.unit,
                    target: Some(target),
                    spell: Some(spell),
                };
                (config.base.evaluate(self, &ctx), ModifierMode::Live)
            }
        };
        let spell_config = self.spell_config(spell);
        let instance = self.build_instance(
            spell,
            &spell_config,
            InstanceSpec {
                target,
                base,
                periodic: true,
                healing: config.healing,
                mode,
            },
        );
        let mut delivery = Delivery::new(config.outcome);
        delivery.on_resolved = config.on_tick.clone();
        self.deliver(instance, delivery);

        let dot = self.dot(id);
        if dot.epoch == epoch && dot.remaining == 0 && self.is_aura_active(aura) {
            self.deactivate_aura(aura);
        }
    }
}
