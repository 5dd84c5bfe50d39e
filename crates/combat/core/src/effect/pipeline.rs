use std::sync::Arc;
use std::time::Duration;

use super::{BaseContext, BaseValue, EffectFn, EffectInstance, ModifierMode, ResolvedEffect, Snapshot};
use crate::aura::EffectHook;
use crate::ids::{ActionId, OtherAction, SpellId, UnitId};
use crate::outcome::{
    AttackKind, AttackTable, Outcome, OutcomeChances, OutcomePolicy, OutcomeTiming, RollInputs,
    armor_damage_modifier, average_resist, partial_resist_bucket,
};
use crate::resource::ResourceKind;
use crate::rng::streams;
use crate::sim::{Simulation, UnitKind};
use crate::spell::{EffectTemplate, FollowUp, ProcMask, SpellConfig, SpellFlags};
use crate::stats::{Multiplier, Stat};
use crate::time::secs_to_duration;

/// What to build for one target (stages 2-4 input).
#[derive(Clone, Copy, Debug)]
pub(crate) struct InstanceSpec {
    pub target: UnitId,
    /// Result of stage 1.
    pub base: f64,
    pub periodic: bool,
    pub healing: bool,
    pub mode: ModifierMode,
}

/// How the remaining stages treat an instance.
#[derive(Clone)]
pub(crate) struct Delivery {
    pub policy: OutcomePolicy,
    pub on_resolved: Option<EffectFn>,
    pub follow_up: Option<FollowUp>,
    /// Refund part of the cost when the instance does not land.
    pub refund: bool,
    /// The outcome has not been decided yet.
    pub roll_pending: bool,
}

impl Delivery {
    pub fn new(policy: OutcomePolicy) -> Self {
        Self {
            policy,
            on_resolved: None,
            follow_up: None,
            refund: false,
            roll_pending: true,
        }
    }

    fn from_template(template: &EffectTemplate, policy: OutcomePolicy) -> Self {
        Self {
            policy,
            on_resolved: template.on_resolved.clone(),
            follow_up: template.follow_up,
            refund: true,
            roll_pending: true,
        }
    }
}

impl Simulation {
    // ========================================================================
    // Entry points
    // ========================================================================

    /// Resolves a damage effect of `spell` against `target`.
    ///
    /// Returns the delivered result, or `None` when the effect is travelling
    /// and will be delivered by a scheduled event.
    pub fn resolve_damage(
        &mut self,
        spell: SpellId,
        target: UnitId,
        base: &BaseValue,
        policy: OutcomePolicy,
    ) -> Option<ResolvedEffect> {
        self.resolve_single(spell, target, base, Delivery::new(policy), false)
    }

    /// Healing counterpart of [`resolve_damage`](Self::resolve_damage).
    pub fn resolve_healing(
        &mut self,
        spell: SpellId,
        target: UnitId,
        base: &BaseValue,
        policy: OutcomePolicy,
    ) -> Option<ResolvedEffect> {
        self.resolve_single(spell, target, base, Delivery::new(policy), true)
    }

    /// Resolves a registered template; templates are validated to carry an
    /// outcome policy.
    pub(crate) fn resolve_template(
        &mut self,
        spell: SpellId,
        target: UnitId,
        template: &EffectTemplate,
        healing: bool,
    ) -> Option<ResolvedEffect> {
        let policy = template.outcome?;
        self.resolve_single(spell, target, &template.base, Delivery::from_template(template, policy), healing)
    }

    fn resolve_single(
        &mut self,
        spell: SpellId,
        target: UnitId,
        base: &BaseValue,
        delivery: Delivery,
        healing: bool,
    ) -> Option<ResolvedEffect> {
        let config = self.spell_config(spell);
        let ctx = BaseContext {
            actor: spell.unit,
            target: Some(target),
            spell: Some(spell),
        };
        let base = base.evaluate(self, &ctx);
        let instance = self.build_instance(
            spell,
            &config,
            InstanceSpec {
                target,
                base,
                periodic: false,
                healing,
                mode: ModifierMode::Live,
            },
        );
        self.launch(instance, delivery, &config)
    }

    /// Damages every unit hostile to the caster.
    ///
    /// The base value is evaluated once and shared; above the configured
    /// target cap each instance is scaled by `cap / targets`. Outcomes are
    /// rolled per target.
    pub(crate) fn resolve_aoe(&mut self, spell: SpellId, template: &EffectTemplate) -> Vec<ResolvedEffect> {
        let Some(policy) = template.outcome else {
            return Vec::new();
        };
        let targets = self.enemies_of(spell.unit);
        if targets.is_empty() {
            return Vec::new();
        }
        let config = self.spell_config(spell);
        let ctx = BaseContext {
            actor: spell.unit,
            target: None,
            spell: Some(spell),
        };
        let base = template.base.evaluate(self, &ctx) * aoe_scale(targets.len(), self.config().aoe_cap_targets);

        let mut delivery = Delivery::from_template(template, policy);
        delivery.refund = false;
        targets
            .into_iter()
            .filter_map(|target| {
                let instance = self.build_instance(
                    spell,
                    &config,
                    InstanceSpec {
                        target,
                        base,
                        periodic: false,
                        healing: false,
                        mode: ModifierMode::Live,
                    },
                );
                self.launch(instance, delivery.clone(), &config)
            })
            .collect()
    }

    /// Captures the attacker-side values a snapshot periodic effect reuses.
    pub(crate) fn take_snapshot(
        &mut self,
        spell: SpellId,
        target: UnitId,
        base: &BaseValue,
        policy: OutcomePolicy,
        healing: bool,
    ) -> Snapshot {
        let config = self.spell_config(spell);
        let ctx = BaseContext {
            actor: spell.unit,
            target: Some(target),
            spell: Some(spell),
        };
        Snapshot {
            base: base.evaluate(self, &ctx),
            multiplier: self.attacker_multiplier(spell.unit, &config, healing),
            crit_chance: self.crit_chance(spell.unit, Some(target), &config, policy.kind),
        }
    }

    // ========================================================================
    // Stages 2-4
    // ========================================================================

    pub(crate) fn build_instance(
        &mut self,
        spell: SpellId,
        config: &SpellConfig,
        spec: InstanceSpec,
    ) -> EffectInstance {
        let proc_mask = match (spec.periodic, spec.healing) {
            (true, true) => ProcMask::PERIODIC_HEALING,
            (true, false) => ProcMask::PERIODIC_DAMAGE,
            (false, _) => config.proc_mask,
        };
        let mut instance = EffectInstance {
            id: self.next_effect_id(),
            spell,
            action: config.action_id,
            actor: spell.unit,
            target: spec.target,
            school: config.school,
            proc_mask,
            amount: spec.base,
            pre_outcome_amount: 0.0,
            outcome: Outcome::Hit,
            periodic: spec.periodic,
            healing: spec.healing,
            resisted: 0.0,
            threat: 0.0,
            mode: spec.mode,
        };

        instance.amount *= match spec.mode {
            ModifierMode::Snapshot(snapshot) => snapshot.multiplier,
            ModifierMode::Live => self.attacker_multiplier(instance.actor, config, spec.healing),
        };
        if !spec.healing {
            self.apply_mitigation(&mut instance, config);
        }
        self.apply_target_modifiers(&mut instance, config);

        instance.amount = instance.amount.max(0.0);
        instance.pre_outcome_amount = instance.amount;
        instance
    }

    fn attacker_multiplier(&self, actor: UnitId, config: &SpellConfig, healing: bool) -> f64 {
        let mut multiplier = config.damage_multiplier;
        if config.flags.contains(SpellFlags::IGNORE_ATTACKER_MODIFIERS) {
            return multiplier;
        }
        let stats = self.unit(actor).stats();
        if healing {
            multiplier *= stats.multiplier(Multiplier::HealingDealt);
        } else {
            multiplier *= stats.multiplier(Multiplier::DamageDealt) * stats.school_dealt(config.school);
            if config.flags.contains(SpellFlags::DISEASE) {
                multiplier *= stats.multiplier(Multiplier::DiseaseDamageDealt);
            }
        }
        multiplier
    }

    fn apply_mitigation(&mut self, instance: &mut EffectInstance, config: &SpellConfig) {
        if config.flags.contains(SpellFlags::IGNORE_RESISTS) {
            return;
        }
        let target = self.unit(instance.target);
        if instance.school.is_physical() {
            let sim = self.config();
            instance.amount *= armor_damage_modifier(
                target.stat(Stat::Armor),
                sim.armor_constant,
                sim.max_armor_reduction,
            );
            return;
        }

        let Some(resistance) = instance.school.resistance() else {
            return;
        };
        let average = average_resist(
            target.stat(resistance),
            self.unit(instance.actor).level(),
            self.config().resistance_per_level,
        );
        if average > 0.0 {
            let roll = self.rng_mut().next_f64(streams::PARTIAL_RESIST);
            instance.resisted = partial_resist_bucket(average, roll);
            instance.amount *= 1.0 - instance.resisted;
        }
    }

    fn apply_target_modifiers(&self, instance: &mut EffectInstance, config: &SpellConfig) {
        if config.flags.contains(SpellFlags::IGNORE_TARGET_MODIFIERS) {
            return;
        }
        let stats = self.unit(instance.target).stats();
        if instance.healing {
            instance.amount *= stats.multiplier(Multiplier::HealingTaken);
            return;
        }

        if instance.school.is_physical() && config.flags.contains(SpellFlags::INCLUDE_TARGET_BONUS_DAMAGE) {
            instance.amount += stats.stat(Stat::BonusPhysicalDamageTaken);
        }
        instance.amount *= stats.multiplier(Multiplier::DamageTaken) * stats.school_taken(instance.school);
        if config.flags.contains(SpellFlags::DISEASE) {
            instance.amount *= stats.multiplier(Multiplier::DiseaseDamageTaken);
        }
        if instance.periodic && instance.school.is_physical() {
            instance.amount *= stats.multiplier(Multiplier::PeriodicPhysicalDamageTaken);
        }
    }

    // ========================================================================
    // Stage 5: outcome
    // ========================================================================

    fn crit_chance(
        &self,
        actor: UnitId,
        target: Option<UnitId>,
        config: &SpellConfig,
        kind: AttackKind,
    ) -> f64 {
        let stat = if kind.is_physical_attack() {
            Stat::MeleeCrit
        } else {
            Stat::SpellCrit
        };
        let taken = target.map_or(0.0, |t| self.unit(t).stat(Stat::BonusCritRatingTaken));
        let rating = self.unit(actor).stat(stat) + config.bonus_crit_rating + taken;
        rating / (self.config().ratings.crit_per_percent * 100.0)
    }

    fn roll_inputs(&self, instance: &EffectInstance, config: &SpellConfig, kind: AttackKind, table: &AttackTable) -> RollInputs {
        let ratings = &self.config().ratings;
        let attacker = self.unit(instance.actor);
        let hit = match kind {
            AttackKind::Melee | AttackKind::Ranged => {
                (attacker.stat(Stat::MeleeHit) + config.bonus_hit_rating) / (ratings.melee_hit_per_percent * 100.0)
            }
            AttackKind::Spell => {
                (attacker.stat(Stat::SpellHit) + config.bonus_hit_rating) / (ratings.spell_hit_per_percent * 100.0)
            }
            AttackKind::Healing => 0.0,
        };
        let expertise = if kind == AttackKind::Melee {
            (attacker.stat(Stat::Expertise) / ratings.expertise_per_quarter_percent).floor() * 0.0025
        } else {
            0.0
        };
        let crit = match instance.mode {
            ModifierMode::Snapshot(snapshot) => snapshot.crit_chance,
            ModifierMode::Live => self.crit_chance(instance.actor, Some(instance.target), config, kind),
        };

        let mut inputs = RollInputs {
            hit,
            expertise,
            crit,
            ..RollInputs::default()
        };
        if table.defender_is_player {
            let defender = self.unit(instance.target);
            inputs.defender_dodge = defender.stat(Stat::Dodge);
            inputs.defender_parry = defender.stat(Stat::Parry);
            inputs.defender_block = defender.stat(Stat::Block);
        }
        inputs
    }

    fn attack_table_for(&self, actor: UnitId, target: UnitId) -> AttackTable {
        let attacker = self.unit(actor);
        attacker.attack_table(target).copied().unwrap_or_else(|| {
            let defender = self.unit(target);
            AttackTable::new(
                attacker.level(),
                attacker.kind().is_player_side(),
                defender.level(),
                defender.kind().is_player_side(),
                self.config(),
            )
        })
    }

    pub(crate) fn roll_outcome(&mut self, instance: &mut EffectInstance, policy: OutcomePolicy, config: &SpellConfig) {
        let outcome = if policy.is_deterministic() {
            Outcome::Hit
        } else {
            let table = self.attack_table_for(instance.actor, instance.target);
            let inputs = self.roll_inputs(instance, config, policy.kind, &table);
            let chances = OutcomeChances::compute(&policy, &table, &inputs);
            let roll = self.rng_mut().next_f64(policy.kind.stream());
            chances.classify(roll)
        };
        instance.outcome = if outcome == Outcome::Hit && instance.resisted > 0.0 {
            Outcome::PartialResist
        } else {
            outcome
        };
    }

    fn refund_cost(&mut self, instance: &EffectInstance, config: &SpellConfig) {
        let Some(cost) = config.cast.cost else {
            return;
        };
        if cost.refund_on_miss <= 0.0 || cost.amount <= 0.0 {
            return;
        }
        let amount = cost.amount * cost.refund_on_miss;
        if let Err(err) = self.gain_resource(instance.actor, cost.kind, amount, ActionId::other(OtherAction::Refund)) {
            tracing::warn!(spell = %instance.spell, %err, "cost refund failed");
        }
    }

    // ========================================================================
    // Stage 6
    // ========================================================================

    fn apply_outcome(&self, instance: &mut EffectInstance, config: &SpellConfig) {
        match instance.outcome {
            Outcome::Miss | Outcome::Dodge | Outcome::Parry => instance.amount = 0.0,
            Outcome::Crit => instance.amount *= config.crit_multiplier,
            Outcome::Glance => instance.amount *= self.config().levels.glance_multiplier,
            Outcome::Block => instance.amount -= self.unit(instance.target).stat(Stat::BlockValue),
            Outcome::Hit | Outcome::PartialResist => {}
        }
        instance.amount = instance.amount.max(0.0);
    }

    // ========================================================================
    // Delivery (stages 5-8)
    // ========================================================================

    fn travel_time(&self, actor: UnitId, config: &SpellConfig) -> Duration {
        let distance = self.unit(actor).distance_from_target();
        if config.missile_speed > 0.0 && distance > 0.0 {
            secs_to_duration(distance / config.missile_speed)
        } else {
            Duration::ZERO
        }
    }

    /// Delivers now, or schedules delivery after the travel time.
    fn launch(
        &mut self,
        mut instance: EffectInstance,
        mut delivery: Delivery,
        config: &SpellConfig,
    ) -> Option<ResolvedEffect> {
        let travel = self.travel_time(instance.actor, config);
        if travel.is_zero() {
            return Some(self.deliver(instance, delivery));
        }
        if config.outcome_timing == OutcomeTiming::AtCast {
            self.roll_outcome(&mut instance, delivery.policy, config);
            delivery.roll_pending = false;
        }
        if self.log_events() && !config.flags.contains(SpellFlags::NO_LOGS) {
            tracing::debug!(time = %self.now(), spell = %instance.spell, target = %instance.target, ?travel, "effect launched");
        }
        self.schedule_in(travel, "effect delivery", move |sim| {
            sim.deliver(instance, delivery);
        });
        None
    }

    /// Runs stages 5-8 and consumes the instance.
    pub(crate) fn deliver(&mut self, mut instance: EffectInstance, delivery: Delivery) -> ResolvedEffect {
        let config = self.spell_config(instance.spell);

        if delivery.roll_pending {
            self.roll_outcome(&mut instance, delivery.policy, &config);
        }
        if delivery.refund && !instance.landed() {
            self.refund_cost(&instance, &config);
        }
        self.apply_outcome(&mut instance, &config);
        self.apply_post_outcome_modifiers(&mut instance);

        if self.enter_proc() {
            self.run_effect_callbacks(&instance, delivery.on_resolved.as_ref());
        }
        self.leave_proc();

        if instance.landed() {
            if let Some(follow_up) = delivery.follow_up {
                self.run_follow_up(&instance, follow_up);
            }
        }

        instance.threat = self.threat_of(&instance, &config);
        if !config.flags.contains(SpellFlags::NO_METRICS) {
            self.spell_mut(instance.spell)
                .metrics_mut(instance.target)
                .record(&instance);
        }
        self.apply_to_health(&instance);

        if self.log_events() && !config.flags.contains(SpellFlags::NO_LOGS) {
            tracing::debug!(
                time = %self.now(),
                spell = %instance.spell,
                unit = %instance.actor,
                target = %instance.target,
                outcome = %instance.outcome,
                amount = instance.amount,
                threat = instance.threat,
                periodic = instance.periodic,
                "effect resolved"
            );
        }
        ResolvedEffect::from(&instance)
    }

    fn run_effect_callbacks(&mut self, instance: &EffectInstance, on_resolved: Option<&EffectFn>) {
        if let Some(callback) = on_resolved {
            let callback = Arc::clone(callback);
            callback(self, instance);
        }
        let (dealt, taken) = EffectHook::for_instance(instance);
        self.dispatch_effect_hooks(instance.actor, dealt, instance);
        self.dispatch_effect_hooks(instance.target, taken, instance);
    }

    fn run_follow_up(&mut self, instance: &EffectInstance, follow_up: FollowUp) {
        match follow_up {
            FollowUp::ActivateAura(aura) => self.activate_aura(aura),
            FollowUp::ApplyDot | FollowUp::RolloverDot => {
                let Some(dot) = self.find_dot(instance.spell, instance.target) else {
                    tracing::warn!(spell = %instance.spell, target = %instance.target, "follow-up names a dot that is not registered");
                    return;
                };
                if follow_up == FollowUp::ApplyDot {
                    self.apply_dot(dot);
                } else {
                    self.rollover_dot(dot);
                }
            }
        }
    }

    /// `(amount × spell multiplier + flat + dynamic) × unit threat multiplier`,
    /// zero when the instance did not land.
    fn threat_of(&self, instance: &EffectInstance, config: &SpellConfig) -> f64 {
        if !instance.landed() {
            return 0.0;
        }
        let mut threat = instance.amount * config.threat_multiplier + config.flat_threat_bonus;
        if let Some(dynamic) = &config.dynamic_threat {
            threat += dynamic(instance);
        }
        threat * self.unit(instance.actor).stats().multiplier(Multiplier::Threat)
    }

    fn apply_to_health(&mut self, instance: &EffectInstance) {
        if instance.amount <= 0.0 {
            return;
        }
        if instance.healing {
            if self.pool(instance.target, ResourceKind::Health).is_some() {
                if let Err(err) =
                    self.gain_resource(instance.target, ResourceKind::Health, instance.amount, instance.action)
                {
                    tracing::warn!(target_unit = %instance.target, %err, "healing not applied to health");
                }
            }
            return;
        }

        if self.unit(instance.target).kind() == UnitKind::Enemy {
            self.encounter_mut().damage_taken += instance.amount;
        }
        if let Some(current) = self.resource(instance.target, ResourceKind::Health) {
            let amount = instance.amount.min(current);
            if let Err(err) = self.spend_resource(instance.target, ResourceKind::Health, amount, instance.action) {
                tracing::warn!(target_unit = %instance.target, %err, "damage not applied to health");
            }
        }
    }
}

/// Per-target scale of an AOE hitting `targets` units.
pub(crate) fn aoe_scale(targets: usize, cap: u32) -> f64 {
    if targets as u64 > u64::from(cap) && targets > 0 {
        f64::from(cap) / targets as f64
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aura::AuraConfig;
    use crate::config::SimConfig;
    use crate::outcome::OutcomePolicy;
    use crate::resource::{PoolKind, ResourcePool};
    use crate::sim::UnitConfig;
    use crate::stats::{Bonus, BonusSource, School};

    fn duel() -> (Simulation, UnitId, UnitId) {
        let mut sim = Simulation::new(SimConfig::default());
        let player = sim
            .add_unit(UnitConfig::new("Player", UnitKind::Player, 80))
            .unwrap();
        let boss = sim
            .add_unit(UnitConfig::new("Boss", UnitKind::Enemy, 83))
            .unwrap();
        (sim, player, boss)
    }

    fn spell(sim: &mut Simulation, unit: UnitId, school: School) -> SpellId {
        sim.register_spell(unit, SpellConfig::new("Test", ActionId::spell(1), school))
            .unwrap()
    }

    #[test]
    fn aoe_scale_only_applies_above_cap() {
        assert_eq!(aoe_scale(4, 10), 1.0);
        assert_eq!(aoe_scale(10, 10), 1.0);
        assert_eq!(aoe_scale(20, 10), 0.5);
    }

    #[test]
    fn always_hit_holy_damage_is_unmodified() {
        let (mut sim, player, boss) = duel();
        let smite = spell(&mut sim, player, School::Holy);

        let result = sim
            .resolve_damage(smite, boss, &BaseValue::Flat(100.0), OutcomePolicy::ALWAYS_HIT)
            .unwrap();

        assert_eq!(result.outcome, Outcome::Hit);
        assert_eq!(result.amount, 100.0);
        assert_eq!(result.threat, 100.0);
        assert_eq!(sim.encounter().damage_taken, 100.0);
    }

    #[test]
    fn armor_reduces_physical_damage() {
        let (mut sim, player, boss) = duel();
        sim.unit_mut(boss).stats_mut().set_base(Stat::Armor, 15232.5);
        let strike = spell(&mut sim, player, School::Physical);

        let result = sim
            .resolve_damage(strike, boss, &BaseValue::Flat(100.0), OutcomePolicy::ALWAYS_HIT)
            .unwrap();

        assert!((result.amount - 50.0).abs() < 1e-9);
    }

    #[test]
    fn multipliers_stack_in_order() {
        let (mut sim, player, boss) = duel();
        sim.unit_mut(player).stats_mut().add_bonus(
            Multiplier::DamageDealt,
            BonusSource::Setup("talent"),
            Bonus::more(1.1),
        );
        sim.unit_mut(boss).stats_mut().add_bonus(
            Multiplier::DamageTaken,
            BonusSource::Setup("debuff"),
            Bonus::more(1.3),
        );
        let bolt = spell(&mut sim, player, School::Holy);

        let result = sim
            .resolve_damage(bolt, boss, &BaseValue::Flat(100.0), OutcomePolicy::ALWAYS_HIT)
            .unwrap();

        assert!((result.amount - 143.0).abs() < 1e-9);
    }

    #[test]
    fn healing_restores_the_target_pool() {
        let (mut sim, player, _) = duel();
        sim.add_pool(player, ResourcePool::new(ResourceKind::Health, PoolKind::Soft, 1000.0).with_starting(400.0))
            .unwrap();
        let heal = spell(&mut sim, player, School::Holy);

        let result = sim
            .resolve_healing(heal, player, &BaseValue::Flat(250.0), OutcomePolicy::HEALING_TICK)
            .unwrap();

        assert_eq!(result.amount, 250.0);
        assert_eq!(sim.resource(player, ResourceKind::Health), Some(650.0));
        assert_eq!(sim.encounter().damage_taken, 0.0);
    }

    #[test]
    fn post_outcome_modifiers_see_the_rolled_outcome() {
        let mut sim = Simulation::new(SimConfig::default());
        let player = sim
            .add_unit(UnitConfig::new("Mage", UnitKind::Player, 80).with_stat(Stat::SpellCrit, 2.0 * 45.91 * 100.0))
            .unwrap();
        let dummy = sim
            .add_unit(UnitConfig::new("Dummy", UnitKind::Enemy, 80))
            .unwrap();
        let ward = sim
            .register_aura(
                dummy,
                AuraConfig::new("Crit Ward")
                    .permanent()
                    .with_post_outcome_modifier(|_, _, instance| {
                        if instance.is_crit() {
                            instance.amount *= 0.5;
                        }
                    }),
            )
            .unwrap();
        let bolt = spell(&mut sim, player, School::Holy);
        sim.finalize().unwrap();
        sim.activate_aura(ward);

        let hit = sim
            .resolve_damage(bolt, dummy, &BaseValue::Flat(100.0), OutcomePolicy::ALWAYS_HIT)
            .unwrap();
        assert_eq!(hit.outcome, Outcome::Hit);
        assert_eq!(hit.amount, 100.0);

        let crit = sim
            .resolve_damage(bolt, dummy, &BaseValue::Flat(100.0), OutcomePolicy::MAGIC_CRIT)
            .unwrap();
        assert_eq!(crit.outcome, Outcome::Crit);
        assert_eq!(crit.amount, 100.0);
        assert_eq!(sim.spell_metrics(bolt, dummy).total_crit_damage, 100.0);

        sim.deactivate_aura(ward);
        let unwarded = sim
            .resolve_damage(bolt, dummy, &BaseValue::Flat(100.0), OutcomePolicy::MAGIC_CRIT)
            .unwrap();
        assert_eq!(unwarded.amount, 200.0);
    }

    #[test]
    fn metrics_are_attributed_per_target() {
        let (mut sim, player, boss) = duel();
        let bolt = spell(&mut sim, player, School::Holy);

        sim.resolve_damage(bolt, boss, &BaseValue::Flat(10.0), OutcomePolicy::ALWAYS_HIT);
        sim.resolve_damage(bolt, boss, &BaseValue::Flat(15.0), OutcomePolicy::ALWAYS_HIT);

        let metrics = sim.spell_metrics(bolt, boss);
        assert_eq!(metrics.hits, 2);
        assert_eq!(metrics.total_damage, 25.0);
        assert!(sim.spell_metrics(bolt, player).is_empty());
    }
}
