use arrayvec::ArrayVec;

use crate::aura::{Aura, ExclusiveSlot};
use crate::config::SimConfig;
use crate::ids::{ActionId, UnitId};
use crate::outcome::AttackTable;
use crate::periodic::Dot;
use crate::resource::{ResourceKind, ResourcePool};
use crate::spell::{CastState, Spell};
use crate::stats::{Stat, UnitStats};

/// Side a combatant fights on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnitKind {
    Player,
    Pet,
    Enemy,
}

impl UnitKind {
    /// Players and pets use player attack tables.
    pub const fn is_player_side(self) -> bool {
        matches!(self, Self::Player | Self::Pet)
    }

    pub const fn is_hostile_to(self, other: UnitKind) -> bool {
        self.is_player_side() != other.is_player_side()
    }
}

/// Setup description of a combatant.
#[derive(Clone, Debug)]
pub struct UnitConfig {
    pub name: String,
    pub kind: UnitKind,
    pub level: u32,
    pub stats: UnitStats,
    /// Yards to the current target, used for travel time.
    pub distance_from_target: f64,
}

impl UnitConfig {
    pub fn new(name: impl Into<String>, kind: UnitKind, level: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            level,
            stats: UnitStats::new(),
            distance_from_target: 0.0,
        }
    }

    #[must_use]
    pub fn with_stats(mut self, stats: UnitStats) -> Self {
        self.stats = stats;
        self
    }

    #[must_use]
    pub fn with_stat(mut self, stat: Stat, value: f64) -> Self {
        self.stats.set_base(stat, value);
        self
    }

    #[must_use]
    pub fn with_distance(mut self, yards: f64) -> Self {
        self.distance_from_target = yards.max(0.0);
        self
    }
}

/// A combatant and every table it owns.
#[derive(Debug)]
pub struct Unit {
    pub(crate) id: UnitId,
    pub(crate) name: String,
    pub(crate) kind: UnitKind,
    pub(crate) level: u32,
    pub(crate) stats: UnitStats,
    pub(crate) pools: ArrayVec<ResourcePool, { SimConfig::MAX_POOLS }>,
    pub(crate) auras: Vec<Aura>,
    /// Indices into `auras` of the currently active ones, in activation order.
    pub(crate) active_auras: Vec<u16>,
    pub(crate) exclusive: ArrayVec<ExclusiveSlot, { SimConfig::MAX_EXCLUSIVE_CATEGORIES }>,
    pub(crate) spells: Vec<Spell>,
    pub(crate) dots: Vec<Dot>,
    /// Indexed by defender; built when the simulation is finalized.
    pub(crate) attack_tables: Vec<AttackTable>,
    pub(crate) cast: CastState,
    pub(crate) distance_from_target: f64,
    pub current_target: Option<UnitId>,
}

impl Unit {
    pub(crate) fn new(id: UnitId, config: UnitConfig) -> Self {
        Self {
            id,
            name: config.name,
            kind: config.kind,
            level: config.level,
            stats: config.stats,
            pools: ArrayVec::new(),
            auras: Vec::new(),
            active_auras: Vec::new(),
            exclusive: ArrayVec::new(),
            spells: Vec::new(),
            dots: Vec::new(),
            attack_tables: Vec::new(),
            cast: CastState::default(),
            distance_from_target: config.distance_from_target,
            current_target: None,
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn stats(&self) -> &UnitStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut UnitStats {
        &mut self.stats
    }

    pub fn stat(&self, stat: Stat) -> f64 {
        self.stats.stat(stat)
    }

    pub fn pool(&self, kind: ResourceKind) -> Option<&ResourcePool> {
        self.pools.iter().find(|pool| pool.kind() == kind)
    }

    pub(crate) fn pool_mut(&mut self, kind: ResourceKind) -> Option<&mut ResourcePool> {
        self.pools.iter_mut().find(|pool| pool.kind() == kind)
    }

    /// Resource pools in registration order.
    pub fn pools(&self) -> impl Iterator<Item = &ResourcePool> {
        self.pools.iter()
    }

    /// Whether resource gained from `source` this iteration generates threat.
    ///
    /// Non-ability sources never do. Abilities that dealt damage this
    /// iteration already carry their threat on the damage.
    pub fn gain_generates_threat(&self, source: ActionId) -> bool {
        if source.is_other() {
            return false;
        }
        !self
            .spells
            .iter()
            .filter(|spell| spell.config().action_id == source)
            .flat_map(|spell| spell.metrics.iter())
            .any(|metrics| metrics.total_damage > 0.0)
    }

    pub fn auras(&self) -> &[Aura] {
        &self.auras
    }

    pub fn find_aura(&self, label: &str) -> Option<&Aura> {
        self.auras.iter().find(|aura| aura.label() == label)
    }

    pub fn active_aura_count(&self) -> usize {
        self.active_auras.len()
    }

    pub fn spells(&self) -> &[Spell] {
        &self.spells
    }

    /// Periodic effects cast by this unit, indexed by [`DotId`](crate::ids::DotId) slot.
    pub fn dots(&self) -> &[Dot] {
        &self.dots
    }

    pub fn cast_state(&self) -> &CastState {
        &self.cast
    }

    pub fn distance_from_target(&self) -> f64 {
        self.distance_from_target
    }

    pub(crate) fn attack_table(&self, defender: UnitId) -> Option<&AttackTable> {
        self.attack_tables.get(defender.index())
    }
}
