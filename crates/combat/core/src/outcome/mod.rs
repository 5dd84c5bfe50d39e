//! Outcome model: what happened to one effect instance.
//!
//! Resolution draws a single uniform number and walks the enabled layers of
//! the ability's [`OutcomePolicy`] in a fixed priority order (miss, dodge,
//! parry, glance, block, crit). Each layer is clamped so the cumulative
//! probability never exceeds one; the remaining mass is a normal hit.

mod roll;
mod table;

pub use roll::{OutcomeChances, RollInputs};
pub use table::{AttackTable, armor_damage_modifier, average_resist, partial_resist_bucket};

bitflags::bitflags! {
    /// Layers of the attack table an ability rolls against.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct OutcomeLayers: u8 {
        const MISS = 1 << 0;
        const DODGE = 1 << 1;
        const PARRY = 1 << 2;
        const GLANCE = 1 << 3;
        const BLOCK = 1 << 4;
        const CRIT = 1 << 5;
    }
}

/// Which base chances and ratings an ability uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttackKind {
    Melee,
    Ranged,
    Spell,
    Healing,
}

impl AttackKind {
    pub const fn is_physical_attack(self) -> bool {
        matches!(self, Self::Melee | Self::Ranged)
    }

    /// Stream the hit table draws from.
    pub const fn stream(self) -> &'static str {
        use crate::rng::streams;
        match self {
            Self::Melee => streams::MELEE_HIT_TABLE,
            Self::Ranged => streams::RANGED_HIT_TABLE,
            Self::Spell => streams::SPELL_HIT_TABLE,
            Self::Healing => streams::HEALING_CRIT,
        }
    }
}

/// Layer selection for one ability or tick template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutcomePolicy {
    pub kind: AttackKind,
    pub layers: OutcomeLayers,
}

impl OutcomePolicy {
    pub const fn new(kind: AttackKind, layers: OutcomeLayers) -> Self {
        Self { kind, layers }
    }

    /// Auto-attacks: the full one-roll table.
    pub const MELEE_WHITE: Self = Self::new(
        AttackKind::Melee,
        OutcomeLayers::MISS
            .union(OutcomeLayers::DODGE)
            .union(OutcomeLayers::PARRY)
            .union(OutcomeLayers::GLANCE)
            .union(OutcomeLayers::BLOCK)
            .union(OutcomeLayers::CRIT),
    );
    /// Special attacks: no glancing blows.
    pub const MELEE_SPECIAL_HIT_AND_CRIT: Self = Self::new(
        AttackKind::Melee,
        OutcomeLayers::MISS
            .union(OutcomeLayers::DODGE)
            .union(OutcomeLayers::PARRY)
            .union(OutcomeLayers::BLOCK)
            .union(OutcomeLayers::CRIT),
    );
    pub const MELEE_SPECIAL_CRIT_ONLY: Self = Self::new(AttackKind::Melee, OutcomeLayers::CRIT);
    pub const RANGED_HIT_AND_CRIT: Self = Self::new(
        AttackKind::Ranged,
        OutcomeLayers::MISS.union(OutcomeLayers::CRIT),
    );
    pub const MAGIC_HIT: Self = Self::new(AttackKind::Spell, OutcomeLayers::MISS);
    pub const MAGIC_HIT_AND_CRIT: Self = Self::new(
        AttackKind::Spell,
        OutcomeLayers::MISS.union(OutcomeLayers::CRIT),
    );
    pub const MAGIC_CRIT: Self = Self::new(AttackKind::Spell, OutcomeLayers::CRIT);
    pub const HEALING_CRIT: Self = Self::new(AttackKind::Healing, OutcomeLayers::CRIT);
    /// Periodic ticks that always land.
    pub const TICK: Self = Self::new(AttackKind::Spell, OutcomeLayers::empty());
    pub const TICK_MAGIC_CRIT: Self = Self::new(AttackKind::Spell, OutcomeLayers::CRIT);
    pub const TICK_PHYSICAL_CRIT: Self = Self::new(AttackKind::Melee, OutcomeLayers::CRIT);
    pub const HEALING_TICK: Self = Self::new(AttackKind::Healing, OutcomeLayers::empty());
    pub const ALWAYS_HIT: Self = Self::new(AttackKind::Spell, OutcomeLayers::empty());

    /// True when resolution needs no random draw.
    pub fn is_deterministic(&self) -> bool {
        self.layers.is_empty()
    }
}

/// When the outcome of a travelling effect is decided.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OutcomeTiming {
    /// Rolled at launch and frozen in the travelling instance.
    #[default]
    AtCast,
    /// Rolled when the effect arrives.
    AtDelivery,
}

/// Classification of one resolved effect instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Outcome {
    Miss,
    Dodge,
    Parry,
    Block,
    Glance,
    #[default]
    Hit,
    Crit,
    /// Landed for a reduced amount because of a partial resist.
    PartialResist,
}

impl Outcome {
    /// Whether the effect reached its target.
    pub const fn landed(self) -> bool {
        !matches!(self, Self::Miss | Self::Dodge | Self::Parry)
    }

    pub const fn is_crit(self) -> bool {
        matches!(self, Self::Crit)
    }

    /// Dodges and parries are avoided after the swing connected with intent,
    /// so some mechanics still read their pre-outcome damage.
    pub const fn is_avoided(self) -> bool {
        matches!(self, Self::Dodge | Self::Parry)
    }
}
