use std::time::Duration;

use proptest::prelude::*;

use combat_core::config::LevelTable;
use combat_core::resource::rage::{RAGE_BAR_LABEL, damage_taken_rage, white_hit_rage};
use combat_core::{
    ActionId, BaseValue, EffectTemplate, InvariantViolation, OtherAction, OutcomePolicy, PoolKind,
    ProcMask, RageBarOptions, ResourceError, ResourceKind, ResourcePool, School, SimConfig, SimTime,
    Simulation, SpellConfig, SpellEffect, SpellId, UnitConfig, UnitId, UnitKind,
};

const SOURCE: ActionId = ActionId::spell(1);

// ============================================================================
// Pool invariants
// ============================================================================

fn pool_kind() -> impl Strategy<Value = PoolKind> {
    prop_oneof![Just(PoolKind::Hard), Just(PoolKind::Soft)]
}

proptest! {
    /// Any mix of gains and spends keeps the pool inside `[0, capacity]`, and
    /// the ledger accounts for every realized change.
    #[test]
    fn pool_stays_in_bounds(
        kind in pool_kind(),
        start in 0.0f64..100.0,
        ops in prop::collection::vec((any::<bool>(), -50.0f64..150.0), 1..50),
    ) {
        let mut pool = ResourcePool::new(ResourceKind::Energy, kind, 100.0).with_starting(start);
        pool.reset();

        for (is_gain, amount) in ops {
            let before = pool.current();
            let result = if is_gain {
                pool.gain(amount, SOURCE)
            } else {
                pool.spend(amount, SOURCE)
            };

            match result {
                Ok(realized) => {
                    prop_assert!(amount >= 0.0);
                    prop_assert!(realized >= 0.0 && realized <= amount);
                }
                Err(ResourceError::NegativeAmount { .. }) => {
                    prop_assert!(amount < 0.0);
                    prop_assert_eq!(pool.current(), before);
                }
                Err(ResourceError::Insufficient { .. }) => {
                    prop_assert_eq!(kind, PoolKind::Hard);
                    prop_assert!(amount > before);
                    prop_assert_eq!(pool.current(), before);
                }
                Err(other) => prop_assert!(false, "unexpected error {other}"),
            }
            prop_assert!(pool.current() >= 0.0);
            prop_assert!(pool.current() <= pool.capacity());
        }

        let ledger = pool.ledger();
        let balance = start + ledger.total_gained() - ledger.total_spent();
        prop_assert!((balance - pool.current()).abs() < 1e-9);
    }
}

#[test]
fn negative_requests_are_counted_by_the_simulation() {
    let mut sim = Simulation::new(SimConfig::default());
    let unit = sim
        .add_unit(UnitConfig::new("Rogue", UnitKind::Player, 80))
        .expect("unit registers");
    sim.add_pool(unit, ResourcePool::new(ResourceKind::Energy, PoolKind::Hard, 100.0))
        .expect("energy pool");
    sim.finalize().expect("finalize");

    assert!(sim.gain_resource(unit, ResourceKind::Energy, -5.0, SOURCE).is_err());
    assert!(sim.spend_resource(unit, ResourceKind::Energy, -5.0, SOURCE).is_err());
    assert_eq!(sim.diagnostics().violations(), 2);
    assert!(matches!(
        sim.diagnostics().last(),
        Some(InvariantViolation::NegativeResourceRequest { kind: ResourceKind::Energy, .. })
    ));

    // Overspending a hard pool is refused but is not a violation.
    assert!(sim.spend_resource(unit, ResourceKind::Energy, 150.0, SOURCE).is_err());
    assert_eq!(sim.diagnostics().violations(), 2);
    assert_eq!(sim.resource(unit, ResourceKind::Energy), Some(100.0));

    assert_eq!(
        sim.gain_resource(unit, ResourceKind::Mana, 5.0, SOURCE),
        Err(ResourceError::MissingPool(ResourceKind::Mana))
    );
}

#[test]
fn duplicate_pools_are_rejected() {
    let mut sim = Simulation::new(SimConfig::default());
    let unit = sim
        .add_unit(UnitConfig::new("Rogue", UnitKind::Player, 80))
        .expect("unit registers");
    sim.add_pool(unit, ResourcePool::new(ResourceKind::Energy, PoolKind::Hard, 100.0))
        .expect("energy pool");
    assert!(sim
        .add_pool(unit, ResourcePool::new(ResourceKind::Energy, PoolKind::Hard, 120.0))
        .is_err());
}

#[test]
fn regeneration_ticks_on_its_interval() {
    let mut sim = Simulation::new(SimConfig::default());
    let unit = sim
        .add_unit(UnitConfig::new("Priest", UnitKind::Player, 80))
        .expect("unit registers");
    sim.add_pool(
        unit,
        ResourcePool::new(ResourceKind::Mana, PoolKind::Hard, 100.0)
            .with_starting(50.0)
            .with_regen(5.0, Duration::from_secs(2)),
    )
    .expect("mana pool");
    sim.finalize().expect("finalize");

    sim.advance(SimTime::from_secs(10));
    assert_eq!(sim.resource(unit, ResourceKind::Mana), Some(75.0));

    sim.advance(SimTime::from_secs(30));
    assert_eq!(sim.resource(unit, ResourceKind::Mana), Some(100.0));

    let pool = sim.pool(unit, ResourceKind::Mana).expect("mana pool");
    let regen = pool
        .ledger()
        .gain_from(ActionId::other(OtherAction::Regen))
        .expect("regen recorded");
    assert_eq!(regen.current.events, 15);
    assert_eq!(regen.current.realized, 50.0);
    assert!(regen.current.wasted() > 0.0);
}

// ============================================================================
// Rage
// ============================================================================

fn warrior_against(levels: LevelTable) -> (Simulation, UnitId, UnitId, SpellId) {
    let mut sim = Simulation::new(SimConfig::default().with_levels(levels));
    let warrior = sim
        .add_unit(UnitConfig::new("Warrior", UnitKind::Player, 80))
        .expect("warrior registers");
    let boss = sim
        .add_unit(UnitConfig::new("Boss", UnitKind::Enemy, 83))
        .expect("boss registers");
    sim.enable_rage_bar(warrior, RageBarOptions::default())
        .expect("rage bar");
    let swing = sim
        .register_spell(
            warrior,
            SpellConfig::new("Melee", ActionId::spell(6603), School::Physical)
                .with_proc_mask(ProcMask::MELEE_MH_AUTO)
                .with_effect(SpellEffect::Damage(EffectTemplate::new(1000.0, OutcomePolicy::MELEE_WHITE))),
        )
        .expect("spell registers");
    sim.finalize().expect("finalize");
    (sim, warrior, boss, swing)
}

/// A dodged swing still generates rage from the damage it would have dealt.
#[test]
fn dodged_white_hit_generates_rage() {
    let levels = LevelTable {
        melee_miss: [0.0; 4],
        dodge: [1.0; 4],
        ..LevelTable::DEFAULT
    };
    let (mut sim, warrior, boss, swing) = warrior_against(levels);
    assert!(sim.unit(warrior).find_aura(RAGE_BAR_LABEL).is_some_and(|aura| aura.is_active()));

    sim.try_cast(swing, boss).expect("swing starts");
    sim.advance(SimTime::ZERO);

    let metrics = sim.spell_metrics(swing, boss);
    assert_eq!(metrics.dodges, 1);
    assert_eq!(metrics.total_damage, 0.0);

    let expected = white_hit_rage(1000.0, 3.6, false, false);
    let rage = sim.resource(warrior, ResourceKind::Rage).expect("rage pool");
    assert!((rage - expected).abs() < 1e-9);
    // Auto-attack rage carries no threat of its own.
    assert_eq!(sim.rage_threat(warrior), 0.0);
}

#[test]
fn missed_white_hit_generates_nothing() {
    let levels = LevelTable {
        melee_miss: [1.0; 4],
        ..LevelTable::DEFAULT
    };
    let (mut sim, warrior, boss, swing) = warrior_against(levels);

    sim.try_cast(swing, boss).expect("swing starts");
    sim.advance(SimTime::ZERO);

    assert_eq!(sim.spell_metrics(swing, boss).misses, 1);
    assert_eq!(sim.resource(warrior, ResourceKind::Rage), Some(0.0));
}

#[test]
fn damage_taken_generates_rage_and_ability_rage_generates_threat() {
    let mut sim = Simulation::new(SimConfig::default());
    let tank = sim
        .add_unit(UnitConfig::new("Warrior", UnitKind::Player, 80))
        .expect("warrior registers");
    let boss = sim
        .add_unit(UnitConfig::new("Boss", UnitKind::Enemy, 83))
        .expect("boss registers");
    sim.enable_rage_bar(tank, RageBarOptions::default())
        .expect("rage bar");
    let smash = sim
        .register_spell(boss, SpellConfig::new("Smash", ActionId::spell(2), School::Holy))
        .expect("spell registers");
    sim.finalize().expect("finalize");

    sim.resolve_damage(smash, tank, &BaseValue::Flat(453.3), OutcomePolicy::ALWAYS_HIT);
    let rage = sim.resource(tank, ResourceKind::Rage).expect("rage pool");
    assert!((rage - damage_taken_rage(453.3)).abs() < 1e-9);
    assert_eq!(sim.rage_threat(tank), 0.0);

    sim.gain_resource(tank, ResourceKind::Rage, 10.0, ActionId::spell(2687))
        .expect("bloodrage");
    assert!((sim.rage_threat(tank) - 50.0).abs() < 1e-9);
}

#[test]
fn rage_bar_returns_every_iteration() {
    let (mut sim, warrior, _, _) = warrior_against(LevelTable::DEFAULT);
    sim.gain_resource(warrior, ResourceKind::Rage, 40.0, ActionId::spell(2687))
        .expect("gain");

    sim.run_iteration().expect("iteration runs");

    let aura = sim.unit(warrior).find_aura(RAGE_BAR_LABEL).expect("rage bar aura");
    assert!(aura.is_active());
    assert_eq!(aura.stats().gains, 2);
    assert_eq!(sim.resource(warrior, ResourceKind::Rage), Some(0.0));

    let summary = sim.aggregate().unit(warrior).expect("unit summary");
    assert!((summary.threat.mean() - 200.0).abs() < 1e-9);
}

/// Rage is a soft pool: spending more than is left empties the bar.
#[test]
fn rage_overspend_clamps_to_zero() {
    let (mut sim, warrior, _, _) = warrior_against(LevelTable::DEFAULT);
    sim.gain_resource(warrior, ResourceKind::Rage, 10.0, ActionId::spell(2687))
        .expect("gain");

    let spent = sim
        .spend_resource(warrior, ResourceKind::Rage, 30.0, ActionId::spell(47475))
        .expect("overspend is clamped");

    assert_eq!(spent, 10.0);
    assert_eq!(sim.resource(warrior, ResourceKind::Rage), Some(0.0));
}

/// Rage granted by an ability that dealt damage this iteration carries no
/// threat of its own; the damage already did.
#[test]
fn damaging_ability_rage_threat_is_counted_once() {
    let (mut sim, warrior, boss, slam) = {
        let mut sim = Simulation::new(SimConfig::default());
        let warrior = sim
            .add_unit(UnitConfig::new("Warrior", UnitKind::Player, 80))
            .expect("warrior registers");
        let boss = sim
            .add_unit(UnitConfig::new("Boss", UnitKind::Enemy, 83))
            .expect("boss registers");
        sim.enable_rage_bar(warrior, RageBarOptions::default())
            .expect("rage bar");
        let slam = sim
            .register_spell(warrior, SpellConfig::new("Shield Slam", ActionId::spell(47488), School::Holy))
            .expect("spell registers");
        sim.finalize().expect("finalize");
        (sim, warrior, boss, slam)
    };

    sim.resolve_damage(slam, boss, &BaseValue::Flat(1000.0), OutcomePolicy::ALWAYS_HIT);
    sim.gain_resource(warrior, ResourceKind::Rage, 10.0, ActionId::spell(47488))
        .expect("slam rage");
    assert_eq!(sim.spell_metrics(slam, boss).total_threat, 1000.0);
    assert_eq!(sim.rage_threat(warrior), 0.0);

    sim.gain_resource(warrior, ResourceKind::Rage, 10.0, ActionId::spell(2687))
        .expect("bloodrage");
    assert!((sim.rage_threat(warrior) - 50.0).abs() < 1e-9);

    sim.run_iteration().expect("iteration runs");
    let aggregate = sim.aggregate();
    let unit = aggregate.unit(warrior).expect("unit summary");
    assert!((unit.threat.mean() - 1050.0).abs() < 1e-9);

    let slam_rage = aggregate
        .resource(warrior, ResourceKind::Rage, ActionId::spell(47488))
        .expect("slam rage summary");
    assert_eq!(slam_rage.gained.mean(), 10.0);
    assert_eq!(slam_rage.threat.mean(), 0.0);
    let bloodrage = aggregate
        .resource(warrior, ResourceKind::Rage, ActionId::spell(2687))
        .expect("bloodrage summary");
    assert!((bloodrage.threat.mean() - 50.0).abs() < 1e-9);
}
