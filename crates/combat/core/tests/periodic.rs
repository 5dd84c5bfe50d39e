use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use combat_core::{
    ActionId, Bonus, BonusSource, DotConfig, DotId, EffectTemplate, FollowUp, Multiplier,
    OutcomePolicy, School, SimConfig, SimTime, Simulation, SpellConfig, SpellEffect, SpellId,
    UnitConfig, UnitId, UnitKind,
};

const TICK: Duration = Duration::from_secs(3);

struct Setup {
    sim: Simulation,
    player: UnitId,
    boss: UnitId,
    spell: SpellId,
    dot: DotId,
}

/// Player with a three-tick, 10-per-tick shadow dot on a boss.
fn corruption(config: DotConfig) -> Setup {
    corruption_with(SpellEffect::ApplyDot, config)
}

fn corruption_with(effect: SpellEffect, config: DotConfig) -> Setup {
    let mut sim = Simulation::new(SimConfig::default());
    let player = sim
        .add_unit(UnitConfig::new("Warlock", UnitKind::Player, 80))
        .expect("player registers");
    let boss = sim
        .add_unit(UnitConfig::new("Boss", UnitKind::Enemy, 83))
        .expect("boss registers");
    let spell = sim
        .register_spell(
            player,
            SpellConfig::new("Corruption", ActionId::spell(47813), School::Shadow).with_effect(effect),
        )
        .expect("spell registers");
    let dot = sim.register_dot(spell, boss, config).expect("dot registers");
    sim.finalize().expect("finalize");
    Setup {
        sim,
        player,
        boss,
        spell,
        dot,
    }
}

fn damage_multiplier(sim: &mut Simulation, unit: UnitId, value: f64) {
    sim.unit_mut(unit).stats_mut().add_bonus(
        Multiplier::DamageDealt,
        BonusSource::Setup("buff"),
        Bonus::more(value),
    );
}

#[test]
fn dot_ticks_at_fixed_intervals_then_expires() {
    let Setup {
        mut sim,
        boss,
        spell,
        dot,
        ..
    } = corruption(DotConfig::new("Corruption", 3, TICK, 10.0));

    sim.try_cast(spell, boss).expect("cast starts");
    sim.advance(SimTime::ZERO);
    assert!(sim.is_dot_active(dot));
    assert_eq!(sim.pending_events(), 3);
    assert_eq!(sim.dot(dot).remaining_ticks(), 3);

    sim.advance(SimTime::from_millis(2999));
    assert_eq!(sim.spell_metrics(spell, boss).ticks, 0);

    sim.advance(SimTime::from_secs(3));
    assert_eq!(sim.spell_metrics(spell, boss).ticks, 1);
    assert_eq!(sim.dot(dot).remaining_ticks(), 2);

    sim.advance(SimTime::from_secs(9));
    let metrics = sim.spell_metrics(spell, boss);
    assert_eq!(metrics.ticks, 3);
    assert_eq!(metrics.total_damage, 30.0);
    assert_eq!(metrics.hits, 0);
    assert!(!sim.is_dot_active(dot));
    assert_eq!(sim.pending_events(), 0);
    assert_eq!(sim.encounter().damage_taken, 30.0);
}

/// A ticking dot reports the time left until its last tick.
#[test]
fn dot_aura_reports_time_until_last_tick() {
    let Setup { mut sim, dot, .. } = corruption(DotConfig::new("Corruption", 3, TICK, 10.0));
    let aura = sim.dot(dot).aura();

    sim.apply_dot(dot);
    assert_eq!(sim.aura_remaining(aura), Some(Duration::from_secs(9)));

    sim.advance(SimTime::from_secs(3));
    assert_eq!(sim.aura_remaining(aura), Some(Duration::from_secs(6)));

    sim.rollover_dot(dot);
    assert_eq!(sim.aura_remaining(aura), Some(Duration::from_secs(9)));

    sim.advance(SimTime::from_secs(12));
    assert!(!sim.is_dot_active(dot));
    assert_eq!(sim.aura_remaining(aura), None);
}

#[test]
fn cancelled_dot_drops_remaining_ticks() {
    let Setup {
        mut sim,
        boss,
        spell,
        dot,
        ..
    } = corruption(DotConfig::new("Corruption", 3, TICK, 10.0));

    sim.try_cast(spell, boss).expect("cast starts");
    sim.advance(SimTime::from_secs(3));
    assert!(sim.cancel_dot(dot));
    assert!(!sim.cancel_dot(dot));

    sim.advance(SimTime::from_secs(20));
    assert_eq!(sim.spell_metrics(spell, boss).total_damage, 10.0);
    assert_eq!(sim.scheduler_stats().cancelled, 2);
    assert!(sim.diagnostics().is_clean());
}

#[test]
fn snapshot_keeps_apply_time_multiplier() {
    let Setup {
        mut sim,
        player,
        boss,
        spell,
        ..
    } = corruption(DotConfig::new("Corruption", 3, TICK, 10.0));

    sim.try_cast(spell, boss).expect("cast starts");
    sim.advance(SimTime::ZERO);
    damage_multiplier(&mut sim, player, 2.0);

    sim.advance(SimTime::from_secs(9));
    assert_eq!(sim.spell_metrics(spell, boss).total_damage, 30.0);
}

#[test]
fn live_dot_reads_current_multiplier() {
    let Setup {
        mut sim,
        player,
        boss,
        spell,
        ..
    } = corruption(DotConfig::new("Corruption", 3, TICK, 10.0).live());

    sim.try_cast(spell, boss).expect("cast starts");
    sim.advance(SimTime::ZERO);
    damage_multiplier(&mut sim, player, 2.0);

    sim.advance(SimTime::from_secs(9));
    assert_eq!(sim.spell_metrics(spell, boss).total_damage, 60.0);
}

#[test]
fn target_modifiers_always_apply_live() {
    let Setup {
        mut sim,
        boss,
        spell,
        ..
    } = corruption(DotConfig::new("Corruption", 3, TICK, 10.0));

    sim.try_cast(spell, boss).expect("cast starts");
    sim.advance(SimTime::ZERO);
    sim.unit_mut(boss).stats_mut().add_bonus(
        Multiplier::DamageTaken,
        BonusSource::Setup("debuff"),
        Bonus::more(1.5),
    );

    sim.advance(SimTime::from_secs(9));
    assert_eq!(sim.spell_metrics(spell, boss).total_damage, 45.0);
}

/// Rolling over after the first tick keeps the 1x snapshot and restarts the
/// tick count: one old tick plus three new ones.
#[test]
fn rollover_restarts_ticks_with_old_snapshot() {
    let Setup {
        mut sim,
        player,
        boss,
        spell,
        dot,
    } = corruption(DotConfig::new("Corruption", 3, TICK, 10.0));

    sim.apply_dot(dot);
    sim.advance(SimTime::from_secs(3));
    damage_multiplier(&mut sim, player, 2.0);
    sim.rollover_dot(dot);
    assert_eq!(sim.dot(dot).remaining_ticks(), 3);

    sim.advance(SimTime::from_secs(9));
    assert!(sim.is_dot_active(dot));

    sim.advance(SimTime::from_secs(12));
    let metrics = sim.spell_metrics(spell, boss);
    assert_eq!(metrics.ticks, 4);
    assert_eq!(metrics.total_damage, 40.0);
    assert!(!sim.is_dot_active(dot));
    assert_eq!(sim.scheduler_stats().cancelled, 2);
}

#[test]
fn reapplying_takes_a_fresh_snapshot() {
    let Setup {
        mut sim,
        player,
        boss,
        spell,
        dot,
    } = corruption(DotConfig::new("Corruption", 3, TICK, 10.0));

    sim.apply_dot(dot);
    sim.advance(SimTime::from_secs(3));
    damage_multiplier(&mut sim, player, 2.0);
    sim.apply_dot(dot);

    sim.advance(SimTime::from_secs(12));
    let metrics = sim.spell_metrics(spell, boss);
    assert_eq!(metrics.ticks, 4);
    assert_eq!(metrics.total_damage, 70.0);
}

#[test]
fn rollover_of_inactive_dot_applies_it() {
    let Setup {
        mut sim,
        boss,
        spell,
        dot,
        ..
    } = corruption(DotConfig::new("Corruption", 2, TICK, 10.0));

    sim.rollover_dot(dot);
    assert!(sim.is_dot_active(dot));
    assert!(sim.dot(dot).snapshot().is_some());

    sim.advance(SimTime::from_secs(6));
    assert_eq!(sim.spell_metrics(spell, boss).total_damage, 20.0);
}

#[test]
fn direct_hit_can_apply_the_dot() {
    let template = EffectTemplate::new(50.0, OutcomePolicy::ALWAYS_HIT).with_follow_up(FollowUp::ApplyDot);
    let Setup {
        mut sim,
        boss,
        spell,
        dot,
        ..
    } = corruption_with(
        SpellEffect::Damage(template),
        DotConfig::new("Corruption", 3, TICK, 10.0),
    );

    sim.try_cast(spell, boss).expect("cast starts");
    sim.advance(SimTime::ZERO);
    assert!(sim.is_dot_active(dot));

    sim.advance(SimTime::from_secs(9));
    let metrics = sim.spell_metrics(spell, boss);
    assert_eq!(metrics.hits, 1);
    assert_eq!(metrics.ticks, 3);
    assert_eq!(metrics.total_damage, 80.0);
}

#[test]
fn tick_callbacks_and_end_of_iteration_sweep() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ticks);
    let Setup {
        mut sim,
        boss,
        spell,
        dot,
        ..
    } = corruption(
        DotConfig::new("Corruption", 100, TICK, 10.0).on_tick(move |_, instance| {
            assert!(instance.periodic);
            counter.fetch_add(1, Ordering::Relaxed);
        }),
    );

    sim.apply_dot(dot);
    sim.run_iteration().expect("iteration runs");

    // 180 s at 3 s per tick; the sweep removes the rest.
    assert_eq!(ticks.load(Ordering::Relaxed), 60);
    let summary = sim.aggregate().spell(spell, boss).expect("summary");
    assert_eq!(summary.totals.ticks, 60);
    assert_eq!(summary.damage.mean(), 600.0);
    assert!(sim.diagnostics().is_clean());
}

#[test]
fn invalid_periodic_definitions_are_rejected() {
    let mut sim = Simulation::new(SimConfig::default());
    let player = sim
        .add_unit(UnitConfig::new("Warlock", UnitKind::Player, 80))
        .expect("player registers");
    let spell = sim
        .register_spell(
            player,
            SpellConfig::new("Corruption", ActionId::spell(47813), School::Shadow),
        )
        .expect("spell registers");

    assert!(sim
        .register_dot(spell, player, DotConfig::new("Empty", 0, TICK, 10.0))
        .is_err());
    assert!(sim
        .register_dot(spell, player, DotConfig::new("Instant", 3, Duration::ZERO, 10.0))
        .is_err());
    assert!(sim
        .register_dot(spell, UnitId(9), DotConfig::new("Nowhere", 3, TICK, 10.0))
        .is_err());
}
