use std::sync::Arc;
use std::time::Duration;

use super::{CastPhase, CastRefusal, CostTiming, SpellConfig, SpellEffect, SpellFlags};
use crate::ids::{SpellId, UnitId};
use crate::sim::Simulation;
use crate::stats::Multiplier;

impl Simulation {
    /// Starts casting `spell` on `target`.
    ///
    /// Checks run in a fixed order: simulation ready, handles valid, caster
    /// idle, global cooldown, ability cooldown, resource. On success the cost
    /// is deducted now (or at completion, per the ability) and the completion
    /// event is enqueued at `now + cast_time`, even when the cast time is zero.
    pub fn try_cast(&mut self, spell: SpellId, target: UnitId) -> Result<(), CastRefusal> {
        if !self.is_finalized() {
            return Err(CastRefusal::NotReady);
        }
        if self.check_spell(spell).is_err() {
            return Err(CastRefusal::UnknownSpell(spell));
        }
        if target.index() >= self.units().len() {
            return Err(CastRefusal::InvalidTarget(target));
        }

        let now = self.now();
        let config = self.spell_config(spell);
        let caster = self.unit(spell.unit);
        match caster.cast.phase {
            CastPhase::Casting { completes_at, .. } => {
                return Err(CastRefusal::Busy { until: completes_at });
            }
            CastPhase::Channeling { ends_at, .. } => {
                return Err(CastRefusal::Busy { until: ends_at });
            }
            CastPhase::Idle => {}
        }
        if !config.cast.gcd.is_zero() && now < caster.cast.gcd_ready_at {
            return Err(CastRefusal::OnGlobalCooldown {
                ready_at: caster.cast.gcd_ready_at,
            });
        }
        let cooldown = &self.spell(spell).cooldown;
        if !cooldown.is_ready(now) {
            return Err(CastRefusal::OnCooldown {
                remaining: cooldown.time_to_ready(now),
            });
        }
        if let Some(cost) = config.cast.cost {
            let available = caster.pool(cost.kind).map_or(0.0, |pool| pool.current());
            if available < cost.amount {
                return Err(CastRefusal::InsufficientResource {
                    kind: cost.kind,
                    required: cost.amount,
                    available,
                });
            }
        }

        self.start_cast(spell, target, &config);
        Ok(())
    }

    /// [`try_cast`](Self::try_cast) for rotation drivers that only need to know
    /// whether the cast started.
    pub fn cast(&mut self, spell: SpellId, target: UnitId) -> bool {
        match self.try_cast(spell, target) {
            Ok(()) => true,
            Err(refusal) => {
                if self.log_events() {
                    tracing::debug!(time = %self.now(), %spell, %refusal, "cast refused");
                }
                false
            }
        }
    }

    fn start_cast(&mut self, spell: SpellId, target: UnitId, config: &SpellConfig) {
        let now = self.now();
        let caster = spell.unit;

        if let Some(cost) = config.cast.cost {
            if cost.timing == CostTiming::OnCastStart && cost.amount > 0.0 {
                if let Err(err) = self.spend_resource(caster, cost.kind, cost.amount, config.action_id) {
                    tracing::warn!(%spell, %err, "cost could not be deducted after the affordability check");
                }
            }
        }

        let haste = if config.flags.contains(SpellFlags::IGNORE_HASTE) {
            1.0
        } else {
            self.unit(caster).stats().multiplier(Multiplier::CastSpeed).max(f64::EPSILON)
        };
        let min_gcd = self.config().min_gcd;
        let gcd = config.cast.gcd;
        let cast_time = config.cast.cast_time.div_f64(haste);
        let completes_at = now + cast_time;

        let state = &mut self.unit_mut(caster).cast;
        if !gcd.is_zero() {
            state.gcd_ready_at = now + gcd.div_f64(haste).max(min_gcd.min(gcd));
        }
        state.token += 1;
        state.phase = CastPhase::Casting {
            spell,
            target,
            completes_at,
        };
        let token = state.token;

        self.schedule_guarded(
            completes_at,
            "cast complete",
            move |sim| sim.unit(caster).cast.token == token,
            move |sim| sim.complete_cast(spell, target),
        );
        if self.log_events() && !config.flags.contains(SpellFlags::NO_LOGS) {
            tracing::debug!(time = %now, %spell, %target, label = config.label, ?cast_time, "cast started");
        }
    }

    /// Stops an in-progress cast or channel. Costs already paid are lost.
    /// Returns false when nothing was in progress.
    pub fn interrupt(&mut self, unit: UnitId) -> bool {
        let state = &mut self.unit_mut(unit).cast;
        if !state.is_busy() {
            return false;
        }
        state.phase = CastPhase::Idle;
        state.token += 1;
        if self.log_events() {
            tracing::debug!(time = %self.now(), %unit, "cast interrupted");
        }
        true
    }

    fn complete_cast(&mut self, spell: SpellId, target: UnitId) {
        let now = self.now();
        let caster = spell.unit;
        let config = self.spell_config(spell);
        let state = &mut self.unit_mut(caster).cast;
        state.phase = CastPhase::Idle;
        state.token += 1;

        if let Some(cost) = config.cast.cost {
            if cost.timing == CostTiming::OnCastComplete && cost.amount > 0.0 {
                if let Err(err) = self.spend_resource(caster, cost.kind, cost.amount, config.action_id) {
                    if self.log_events() {
                        tracing::debug!(time = %now, %spell, %err, "cast fizzled");
                    }
                    return;
                }
            }
        }

        let record = !config.flags.contains(SpellFlags::NO_METRICS);
        let state = self.spell_mut(spell);
        state.cooldown.consume(now);
        if record {
            state.metrics_mut(target).casts += 1;
        }

        if !config.cast.channel_time.is_zero() {
            self.start_channel(spell, config.cast.channel_time);
        }
        if self.log_events() && !config.flags.contains(SpellFlags::NO_LOGS) {
            tracing::debug!(time = %now, %spell, %target, label = config.label, "cast completed");
        }
        self.apply_spell_effect(spell, target, &config);
    }

    fn start_channel(&mut self, spell: SpellId, duration: Duration) {
        let caster = spell.unit;
        let ends_at = self.now() + duration;
        let state = &mut self.unit_mut(caster).cast;
        state.token += 1;
        state.phase = CastPhase::Channeling { spell, ends_at };
        let token = state.token;
        self.schedule_guarded(
            ends_at,
            "channel end",
            move |sim| sim.unit(caster).cast.token == token,
            move |sim| {
                let state = &mut sim.unit_mut(caster).cast;
                state.phase = CastPhase::Idle;
                state.token += 1;
            },
        );
    }

    fn apply_spell_effect(&mut self, spell: SpellId, target: UnitId, config: &SpellConfig) {
        match &config.effect {
            SpellEffect::None => {}
            SpellEffect::Damage(template) => {
                self.resolve_template(spell, target, template, false);
            }
            SpellEffect::Healing(template) => {
                self.resolve_template(spell, target, template, true);
            }
            SpellEffect::AoeDamage(template) => {
                self.resolve_aoe(spell, template);
            }
            SpellEffect::ApplyDot => match self.find_dot(spell, target) {
                Some(dot) => self.apply_dot(dot),
                None => tracing::warn!(%spell, %target, "no periodic effect registered for this target"),
            },
            SpellEffect::ActivateAura(aura) => self.activate_aura(*aura),
            SpellEffect::Custom(effect) => {
                let effect = Arc::clone(effect);
                effect(self, spell, target);
            }
        }
    }
}
