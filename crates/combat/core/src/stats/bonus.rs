//! Bonus application following the layered stack:
//! Flat → %Inc → More.
//!
//! Every bonus is tagged with the [`BonusSource`] that added it. Removing a
//! source drops exactly the entries it added, so an aura that applies a
//! modifier on gain and removes it on expire always restores the previous
//! value bit-for-bit (the stack is re-folded, never "divided back out").

use crate::ids::AuraId;

/// A single bonus that can be applied to a stat value.
///
/// - **Flat**: added to the base first (e.g. +100 attack power)
/// - **Increased**: fractions summed, then multiplied once (0.05 + 0.10 → ×1.15)
/// - **More**: independent multipliers applied sequentially (×1.04, ×0.9)
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bonus {
    Flat(f64),
    Increased(f64),
    More(f64),
}

impl Bonus {
    pub const fn flat(value: f64) -> Self {
        Bonus::Flat(value)
    }

    /// Additive percentage as a fraction (`0.2` = +20%).
    pub const fn increased(fraction: f64) -> Self {
        Bonus::Increased(fraction)
    }

    /// Independent multiplier (`1.5` = ×1.5).
    pub const fn more(multiplier: f64) -> Self {
        Bonus::More(multiplier)
    }
}

/// Who added a bonus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum BonusSource {
    /// Added by an aura; removed when the aura expires.
    Aura(AuraId),
    /// Added during setup (talents, gear); survives iteration resets.
    Setup(&'static str),
}

impl BonusSource {
    pub const fn is_aura(&self) -> bool {
        matches!(self, Self::Aura(_))
    }
}

/// Collection of tagged bonuses applied in the fixed layer order.
///
/// # Example
/// ```
/// # use combat_core::stats::{Bonus, BonusSource, BonusStack};
/// let mut stack = BonusStack::new();
/// stack.add(BonusSource::Setup("gear"), Bonus::flat(5.0));
/// stack.add(BonusSource::Setup("talent"), Bonus::increased(0.2));
/// stack.add(BonusSource::Setup("talent"), Bonus::more(1.5));
///
/// // (10 + 5) × 1.2 × 1.5
/// assert!((stack.apply(10.0) - 27.0).abs() < 1e-9);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BonusStack {
    entries: Vec<(BonusSource, Bonus)>,
}

impl BonusStack {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, source: BonusSource, bonus: Bonus) {
        self.entries.push((source, bonus));
    }

    /// Removes every entry added by `source`; returns how many were removed.
    pub fn remove_source(&mut self, source: BonusSource) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(s, _)| *s != source);
        before - self.entries.len()
    }

    /// Applies all bonuses to `base`.
    ///
    /// # Formula
    /// ```text
    /// result = (base + Σflat) × (1 + Σinc) × Πmore
    /// ```
    pub fn apply(&self, base: f64) -> f64 {
        let mut flat = 0.0;
        let mut increased = 0.0;
        let mut more = 1.0;
        for (_, bonus) in &self.entries {
            match *bonus {
                Bonus::Flat(v) => flat += v,
                Bonus::Increased(f) => increased += f,
                Bonus::More(m) => more *= m,
            }
        }
        (base + flat) * (1.0 + increased) * more
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of entries contributed by auras.
    pub fn aura_entries(&self) -> usize {
        self.entries.iter().filter(|(s, _)| s.is_aura()).count()
    }
}
