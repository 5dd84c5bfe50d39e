//! Combatant statistics: base values plus tagged bonus stacks.
//!
//! Each stat, multiplier and per-school multiplier is an independent
//! [`BonusStack`]. Reads always fold the current stack, so values are live:
//! a periodic effect in `Live` mode sees buffs gained after it was applied.

pub mod bonus;
mod sheet;

pub use bonus::{Bonus, BonusSource, BonusStack};
pub use sheet::UnitStats;

/// Damage school of an ability.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumCount,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum School {
    Physical,
    Arcane,
    Fire,
    Frost,
    Holy,
    Nature,
    Shadow,
}

impl School {
    pub const fn is_physical(self) -> bool {
        matches!(self, Self::Physical)
    }

    /// Resistance stat mitigating this school, if any.
    pub const fn resistance(self) -> Option<Stat> {
        match self {
            Self::Arcane => Some(Stat::ArcaneResistance),
            Self::Fire => Some(Stat::FireResistance),
            Self::Frost => Some(Stat::FrostResistance),
            Self::Nature => Some(Stat::NatureResistance),
            Self::Shadow => Some(Stat::ShadowResistance),
            Self::Physical | Self::Holy => None,
        }
    }
}

/// Additive combat stats.
///
/// Ratings (`*Hit`, `*Crit`, `Expertise`) are converted to chances through
/// [`RatingConversions`](crate::config::RatingConversions). `Dodge`, `Parry`
/// and `Block` are chances expressed as fractions and only apply to player
/// defenders.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumCount,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Stat {
    AttackPower,
    RangedAttackPower,
    SpellPower,
    MeleeHit,
    SpellHit,
    MeleeCrit,
    SpellCrit,
    Expertise,
    Armor,
    Dodge,
    Parry,
    Block,
    BlockValue,
    /// Flat damage added to physical hits taken (gated per ability).
    BonusPhysicalDamageTaken,
    /// Crit rating granted to attackers of this unit.
    BonusCritRatingTaken,
    ArcaneResistance,
    FireResistance,
    FrostResistance,
    NatureResistance,
    ShadowResistance,
}

/// Multiplicative modifiers, all starting at 1.0.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumCount,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Multiplier {
    DamageDealt,
    DamageTaken,
    HealingDealt,
    HealingTaken,
    Threat,
    /// Divides cast times and the global cooldown.
    CastSpeed,
    DiseaseDamageDealt,
    DiseaseDamageTaken,
    PeriodicPhysicalDamageTaken,
}

/// Addressable slot of a [`UnitStats`] sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatTarget {
    Stat(Stat),
    Multiplier(Multiplier),
    SchoolDealt(School),
    SchoolTaken(School),
}

impl From<Stat> for StatTarget {
    fn from(stat: Stat) -> Self {
        Self::Stat(stat)
    }
}

impl From<Multiplier> for StatTarget {
    fn from(multiplier: Multiplier) -> Self {
        Self::Multiplier(multiplier)
    }
}
