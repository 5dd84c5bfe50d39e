use std::sync::{Arc, Mutex};
use std::time::Duration;

use proptest::prelude::*;

use combat_core::{
    ActionId, AuraConfig, AuraId, BaseValue, Bonus, BonusSource, EffectInstance, EffectTemplate,
    Multiplier, OutcomePolicy, School, SimConfig, SimTime, Simulation, SpellConfig, SpellEffect,
    StackChange, Stat, UnitConfig, UnitId, UnitKind,
};

const BASE_AP: f64 = 1000.0;

fn player() -> (Simulation, UnitId) {
    let mut sim = Simulation::new(SimConfig::default());
    let unit = sim
        .add_unit(UnitConfig::new("Player", UnitKind::Player, 80).with_stat(Stat::AttackPower, BASE_AP))
        .expect("player registers");
    (sim, unit)
}

fn battle_shout() -> AuraConfig {
    AuraConfig::new("Battle Shout")
        .with_duration(Duration::from_secs(10))
        .with_stacks(5, 1)
        .with_bonus(Stat::AttackPower, Bonus::flat(100.0))
}

// ============================================================================
// Lifecycle properties
// ============================================================================

#[derive(Clone, Debug)]
enum Op {
    Activate,
    Refresh,
    Deactivate,
    AddStack,
    RemoveStack,
    SetStacks(u32),
    Advance(u64),
    Extend(u64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Activate),
        Just(Op::Refresh),
        Just(Op::Deactivate),
        Just(Op::AddStack),
        Just(Op::RemoveStack),
        (0u32..8).prop_map(Op::SetStacks),
        (0u64..5000).prop_map(Op::Advance),
        (0u64..5000).prop_map(Op::Extend),
    ]
}

fn apply(sim: &mut Simulation, aura: AuraId, op: &Op) {
    match *op {
        Op::Activate => sim.activate_aura(aura),
        Op::Refresh => sim.refresh_aura(aura),
        Op::Deactivate => sim.deactivate_aura(aura),
        Op::AddStack => {
            sim.add_stack(aura);
        }
        Op::RemoveStack => {
            sim.remove_stack(aura);
        }
        Op::SetStacks(n) => {
            sim.set_stacks(aura, n);
        }
        Op::Advance(ms) => {
            sim.advance_by(Duration::from_millis(ms));
        }
        Op::Extend(ms) => {
            sim.extend_aura(aura, Duration::from_millis(ms));
        }
    }
}

proptest! {
    /// Whatever the sequence of transitions, stat bonuses exist exactly while
    /// the aura is active, and the end-of-iteration sweep balances every gain
    /// with an expiration.
    #[test]
    fn aura_bonuses_never_drift(ops in prop::collection::vec(op(), 1..30)) {
        let (mut sim, unit) = player();
        let aura = sim.register_aura(unit, battle_shout()).expect("aura registers");
        sim.finalize().expect("finalize");

        for op in &ops {
            apply(&mut sim, aura, op);

            let active = sim.is_aura_active(aura);
            let stats = sim.aura(aura).stats();
            prop_assert!(sim.aura_stacks(aura) <= 5);
            prop_assert_eq!(active, sim.aura_stacks(aura) > 0);
            prop_assert_eq!(stats.gains, stats.expirations + u64::from(active));
            prop_assert_eq!(sim.unit(unit).stats().aura_entries(), usize::from(active));
            let expected = if active { BASE_AP + 100.0 } else { BASE_AP };
            prop_assert_eq!(sim.unit(unit).stat(Stat::AttackPower), expected);
        }

        sim.run_iteration().expect("iteration runs");
        let stats = sim.aura(aura).stats();
        prop_assert!(!sim.is_aura_active(aura));
        prop_assert_eq!(stats.gains, stats.expirations);
        prop_assert_eq!(sim.unit(unit).stats().aura_entries(), 0);
        prop_assert_eq!(sim.unit(unit).stat(Stat::AttackPower), BASE_AP);
    }
}

// ============================================================================
// Transitions
// ============================================================================

#[test]
fn refresh_resets_duration() {
    let (mut sim, unit) = player();
    let aura = sim.register_aura(unit, battle_shout()).expect("aura registers");
    sim.finalize().expect("finalize");

    sim.activate_aura(aura);
    sim.advance(SimTime::from_secs(6));
    assert_eq!(sim.aura_remaining(aura), Some(Duration::from_secs(4)));

    sim.activate_aura(aura);
    assert_eq!(sim.aura_remaining(aura), Some(Duration::from_secs(10)));

    sim.advance(SimTime::from_secs(12));
    assert!(sim.is_aura_active(aura));
    sim.advance(SimTime::from_secs(16));
    assert!(!sim.is_aura_active(aura));

    let stats = sim.aura(aura).stats();
    assert_eq!(stats.gains, 1);
    assert_eq!(stats.refreshes, 1);
    assert_eq!(stats.expirations, 1);
    assert_eq!(stats.uptime, Duration::from_secs(16));
    assert_eq!(sim.scheduler_stats().cancelled, 1);
}

#[test]
fn extend_pushes_back_expiry() {
    let (mut sim, unit) = player();
    let aura = sim.register_aura(unit, battle_shout()).expect("aura registers");
    let permanent = sim
        .register_aura(unit, AuraConfig::new("Stance").permanent())
        .expect("aura registers");
    sim.finalize().expect("finalize");

    assert!(!sim.extend_aura(aura, Duration::from_secs(5)));
    sim.activate_aura(aura);
    assert!(sim.extend_aura(aura, Duration::from_secs(5)));
    sim.activate_aura(permanent);
    assert!(!sim.extend_aura(permanent, Duration::from_secs(5)));
    assert_eq!(sim.aura_remaining(permanent), None);

    sim.advance(SimTime::from_secs(14));
    assert!(sim.is_aura_active(aura));
    sim.advance(SimTime::from_secs(15));
    assert!(!sim.is_aura_active(aura));
    assert!(sim.is_aura_active(permanent));
}

#[test]
fn double_deactivation_is_counted_not_applied() {
    let expirations = Arc::new(Mutex::new(0u32));
    let counter = Arc::clone(&expirations);
    let (mut sim, unit) = player();
    let aura = sim
        .register_aura(
            unit,
            battle_shout().on_expire(move |_, _| *counter.lock().expect("lock") += 1),
        )
        .expect("aura registers");
    sim.finalize().expect("finalize");

    sim.activate_aura(aura);
    sim.deactivate_aura(aura);
    sim.deactivate_aura(aura);

    assert_eq!(*expirations.lock().expect("lock"), 1);
    assert_eq!(sim.diagnostics().violations(), 1);
    assert_eq!(sim.unit(unit).stat(Stat::AttackPower), BASE_AP);
}

#[test]
fn exclusive_category_swaps_holder() {
    let (mut sim, unit) = player();
    let might = sim
        .register_aura(
            unit,
            AuraConfig::new("Blessing of Might")
                .with_category("Blessing")
                .with_bonus(Stat::AttackPower, Bonus::flat(550.0)),
        )
        .expect("aura registers");
    let kings = sim
        .register_aura(
            unit,
            AuraConfig::new("Blessing of Kings")
                .with_category("Blessing")
                .with_bonus(Multiplier::DamageDealt, Bonus::more(1.1)),
        )
        .expect("aura registers");
    sim.finalize().expect("finalize");

    sim.activate_aura(might);
    assert_eq!(sim.exclusive_holder(unit, "Blessing"), Some(might));
    assert_eq!(sim.unit(unit).stat(Stat::AttackPower), BASE_AP + 550.0);

    sim.activate_aura(kings);
    assert!(!sim.is_aura_active(might));
    assert!(sim.is_aura_active(kings));
    assert_eq!(sim.exclusive_holder(unit, "Blessing"), Some(kings));
    assert_eq!(sim.unit(unit).stat(Stat::AttackPower), BASE_AP);
    assert!((sim.unit(unit).stats().multiplier(Multiplier::DamageDealt) - 1.1).abs() < 1e-12);
    assert_eq!(sim.aura(might).stats().expirations, 1);

    sim.deactivate_aura(kings);
    assert_eq!(sim.exclusive_holder(unit, "Blessing"), None);
    assert_eq!(sim.exclusive_holder(unit, "Aspect"), None);
}

#[test]
fn stacks_are_bounded() {
    let changes = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&changes);
    let (mut sim, unit) = player();
    let aura = sim
        .register_aura(
            unit,
            battle_shout().on_stacks_change(move |_, _, old, new| log.lock().expect("lock").push((old, new))),
        )
        .expect("aura registers");
    sim.finalize().expect("finalize");

    assert_eq!(sim.add_stack(aura), StackChange::Inactive);
    sim.activate_aura(aura);
    assert_eq!(sim.aura_stacks(aura), 1);
    for _ in 0..4 {
        assert!(matches!(sim.add_stack(aura), StackChange::Changed { .. }));
    }
    assert_eq!(sim.add_stack(aura), StackChange::Capped);
    assert!(sim.diagnostics().is_clean());

    assert_eq!(sim.set_stacks(aura, 9), StackChange::Capped);
    assert_eq!(sim.aura_stacks(aura), 5);
    assert_eq!(sim.diagnostics().violations(), 1);

    assert_eq!(sim.set_stacks(aura, 2), StackChange::Changed { old: 5, new: 2 });
    sim.remove_stack(aura);
    assert_eq!(sim.remove_stack(aura), StackChange::Changed { old: 1, new: 0 });
    assert!(!sim.is_aura_active(aura));
    assert_eq!(sim.remove_stack(aura), StackChange::Inactive);

    let changes = changes.lock().expect("lock");
    assert_eq!(changes.first(), Some(&(1, 2)));
    assert_eq!(changes.last(), Some(&(1, 0)));
    assert_eq!(changes.len(), 7);
}

/// An aura consumed by the next effect its owner deals.
#[test]
fn effect_listener_can_consume_its_aura() {
    let (mut sim, unit) = player();
    let boss = sim
        .add_unit(UnitConfig::new("Boss", UnitKind::Enemy, 83))
        .expect("boss registers");
    let clearcasting = sim
        .register_aura(
            unit,
            AuraConfig::new("Clearcasting")
                .with_duration(Duration::from_secs(15))
                .on_effect_dealt(|sim, aura, instance| {
                    if !instance.periodic {
                        sim.deactivate_aura(aura);
                    }
                }),
        )
        .expect("aura registers");
    let bolt = sim
        .register_spell(
            unit,
            SpellConfig::new("Bolt", ActionId::spell(1), School::Holy)
                .with_effect(SpellEffect::Damage(EffectTemplate::new(10.0, OutcomePolicy::ALWAYS_HIT))),
        )
        .expect("spell registers");
    sim.finalize().expect("finalize");

    sim.activate_aura(clearcasting);
    sim.try_cast(bolt, boss).expect("cast starts");
    sim.advance(SimTime::ZERO);

    assert!(!sim.is_aura_active(clearcasting));
    assert!(sim.diagnostics().is_clean());
    // Its pending expiry is now stale.
    sim.advance(SimTime::from_secs(20));
    assert_eq!(sim.aura(clearcasting).stats().expirations, 1);
}

/// Healing reaches the healing listeners only, damage the damage listeners.
#[test]
fn healing_and_damage_listeners_are_separate() {
    let (mut sim, unit) = player();
    let boss = sim
        .add_unit(UnitConfig::new("Boss", UnitKind::Enemy, 83))
        .expect("boss registers");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = |label: &'static str| {
        let seen = Arc::clone(&seen);
        move |_: &mut Simulation, _: AuraId, _: &EffectInstance| {
            seen.lock().expect("lock").push(label);
        }
    };
    let listener = sim
        .register_aura(
            unit,
            AuraConfig::new("Listener")
                .permanent()
                .on_effect_dealt(log("dealt"))
                .on_effect_taken(log("taken"))
                .on_heal_dealt(log("heal dealt"))
                .on_heal_taken(log("heal taken")),
        )
        .expect("aura registers");
    let spell = sim
        .register_spell(unit, SpellConfig::new("Holy Shock", ActionId::spell(48825), School::Holy))
        .expect("spell registers");
    sim.finalize().expect("finalize");
    sim.activate_aura(listener);

    sim.resolve_healing(spell, unit, &BaseValue::Flat(50.0), OutcomePolicy::ALWAYS_HIT);
    assert_eq!(*seen.lock().expect("lock"), vec!["heal dealt", "heal taken"]);

    seen.lock().expect("lock").clear();
    sim.resolve_damage(spell, boss, &BaseValue::Flat(50.0), OutcomePolicy::ALWAYS_HIT);
    assert_eq!(*seen.lock().expect("lock"), vec!["dealt"]);
}

#[test]
fn registration_rejects_bad_auras() {
    let (mut sim, unit) = player();
    assert!(sim
        .register_aura(unit, AuraConfig::new("Broken").with_stacks(2, 3))
        .is_err());
    sim.register_aura(unit, battle_shout()).expect("aura registers");
    assert!(sim.register_aura(unit, battle_shout()).is_err());
    sim.unit_mut(unit).stats_mut().add_bonus(
        Stat::AttackPower,
        BonusSource::Setup("gear"),
        Bonus::flat(10.0),
    );
    assert_eq!(sim.unit(unit).stats().aura_entries(), 0);
}
