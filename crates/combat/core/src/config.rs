//! Run configuration: fixed capacities and runtime-tunable combat constants.

use std::time::Duration;

use crate::error::ConfigError;

/// Conversions from combat ratings to percentage points.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RatingConversions {
    /// Melee/ranged hit rating per 1% hit chance.
    pub melee_hit_per_percent: f64,
    /// Spell hit rating per 1% hit chance.
    pub spell_hit_per_percent: f64,
    /// Crit rating per 1% crit chance (melee, ranged and spell).
    pub crit_per_percent: f64,
    /// Expertise rating per 0.25% dodge/parry reduction.
    pub expertise_per_quarter_percent: f64,
}

impl RatingConversions {
    pub const DEFAULT: Self = Self {
        melee_hit_per_percent: 32.79,
        spell_hit_per_percent: 26.232,
        crit_per_percent: 45.91,
        expertise_per_quarter_percent: 8.1975,
    };
}

impl Default for RatingConversions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Attack-table chances indexed by level difference (defender - attacker,
/// clamped to `0..=3`).
///
/// Values are probabilities in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelTable {
    pub melee_miss: [f64; 4],
    pub spell_miss: [f64; 4],
    pub dodge: [f64; 4],
    pub parry: [f64; 4],
    pub glance: [f64; 4],
    pub crit_suppression: [f64; 4],
    /// Flat block chance of non-player defenders.
    pub block: f64,
    /// Damage multiplier applied to glancing blows.
    pub glance_multiplier: f64,
}

impl LevelTable {
    pub const DEFAULT: Self = Self {
        melee_miss: [0.05, 0.055, 0.06, 0.08],
        spell_miss: [0.04, 0.05, 0.06, 0.17],
        dodge: [0.05, 0.055, 0.06, 0.065],
        parry: [0.05, 0.055, 0.06, 0.14],
        glance: [0.06, 0.12, 0.18, 0.24],
        crit_suppression: [0.0, 0.01, 0.02, 0.048],
        block: 0.05,
        glance_multiplier: 0.75,
    };

    /// Clamped row index for a level difference.
    pub fn row(level_diff: i32) -> usize {
        level_diff.clamp(0, 3) as usize
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Simulation configuration constants and tunable parameters.
///
/// Shared read-only across worker threads in a batch; each run clones the
/// `Arc` rather than the struct.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Length of one iteration.
    pub duration: Duration,
    /// Seed of iteration 0; iteration `i` uses `base_seed + i`.
    pub base_seed: u64,
    /// Emit per-event `tracing::debug!` records (casts, effects, auras, resources).
    pub log_events: bool,
    pub ratings: RatingConversions,
    pub levels: LevelTable,
    /// Armor constant `K` of the reduction curve `armor / (armor + K)`.
    pub armor_constant: f64,
    /// Upper bound on armor damage reduction.
    pub max_armor_reduction: f64,
    /// Resistance needed per attacker level for the maximum average resist.
    pub resistance_per_level: f64,
    /// Target count above which AOE damage is scaled down.
    pub aoe_cap_targets: u32,
    /// Global cooldown floor after haste scaling.
    pub min_gcd: Duration,
    /// Maximum nesting depth of effect callbacks before procs are suppressed.
    pub max_proc_depth: u32,
}

impl SimConfig {
    // ===== compile-time capacities =====
    /// Maximum number of combatants in one run.
    pub const MAX_UNITS: usize = 64;
    /// Maximum number of resource pools per combatant.
    pub const MAX_POOLS: usize = 4;
    /// Maximum number of exclusive aura categories per combatant.
    pub const MAX_EXCLUSIVE_CATEGORIES: usize = 8;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_DURATION: Duration = Duration::from_secs(180);
    pub const DEFAULT_SEED: u64 = 0x5EED;
    pub const DEFAULT_ARMOR_CONSTANT: f64 = 15232.5;
    pub const DEFAULT_MAX_ARMOR_REDUCTION: f64 = 0.75;
    pub const DEFAULT_RESISTANCE_PER_LEVEL: f64 = 5.0;
    pub const DEFAULT_AOE_CAP_TARGETS: u32 = 10;
    pub const DEFAULT_MIN_GCD: Duration = Duration::from_secs(1);
    pub const DEFAULT_MAX_PROC_DEPTH: u32 = 16;

    pub fn new() -> Self {
        Self {
            duration: Self::DEFAULT_DURATION,
            base_seed: Self::DEFAULT_SEED,
            log_events: false,
            ratings: RatingConversions::DEFAULT,
            levels: LevelTable::DEFAULT,
            armor_constant: Self::DEFAULT_ARMOR_CONSTANT,
            max_armor_reduction: Self::DEFAULT_MAX_ARMOR_REDUCTION,
            resistance_per_level: Self::DEFAULT_RESISTANCE_PER_LEVEL,
            aoe_cap_targets: Self::DEFAULT_AOE_CAP_TARGETS,
            min_gcd: Self::DEFAULT_MIN_GCD,
            max_proc_depth: Self::DEFAULT_MAX_PROC_DEPTH,
        }
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, base_seed: u64) -> Self {
        self.base_seed = base_seed;
        self
    }

    #[must_use]
    pub fn with_event_logging(mut self, enabled: bool) -> Self {
        self.log_events = enabled;
        self
    }

    #[must_use]
    pub fn with_levels(mut self, levels: LevelTable) -> Self {
        self.levels = levels;
        self
    }

    #[must_use]
    pub fn with_aoe_cap(mut self, targets: u32) -> Self {
        self.aoe_cap_targets = targets;
        self
    }

    #[must_use]
    pub fn with_max_proc_depth(mut self, depth: u32) -> Self {
        self.max_proc_depth = depth;
        self
    }

    /// Seed used by iteration `iteration`.
    pub fn iteration_seed(&self, iteration: u64) -> u64 {
        self.base_seed.wrapping_add(iteration)
    }

    /// Checks that every tunable lies in its meaningful range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "duration",
                reason: "must be positive",
            });
        }
        if !(self.armor_constant > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "armor_constant",
                reason: "must be positive",
            });
        }
        if !(0.0..=1.0).contains(&self.max_armor_reduction) {
            return Err(ConfigError::InvalidValue {
                field: "max_armor_reduction",
                reason: "must lie in [0, 1]",
            });
        }
        if !(self.resistance_per_level > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "resistance_per_level",
                reason: "must be positive",
            });
        }
        if self.aoe_cap_targets == 0 {
            return Err(ConfigError::InvalidValue {
                field: "aoe_cap_targets",
                reason: "must be at least one",
            });
        }
        if self.max_proc_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_proc_depth",
                reason: "must be at least one",
            });
        }
        let ratings = &self.ratings;
        let conversions = [
            ratings.melee_hit_per_percent,
            ratings.spell_hit_per_percent,
            ratings.crit_per_percent,
            ratings.expertise_per_quarter_percent,
        ];
        if conversions.iter().any(|value| !(*value > 0.0)) {
            return Err(ConfigError::InvalidValue {
                field: "ratings",
                reason: "conversions must be positive",
            });
        }
        let levels = &self.levels;
        let chances = [
            levels.melee_miss,
            levels.spell_miss,
            levels.dodge,
            levels.parry,
            levels.glance,
            levels.crit_suppression,
        ];
        let in_unit_range = |p: f64| (0.0..=1.0).contains(&p);
        if !chances.iter().flatten().copied().all(in_unit_range)
            || !in_unit_range(levels.block)
        {
            return Err(ConfigError::InvalidValue {
                field: "levels",
                reason: "chances must lie in [0, 1]",
            });
        }
        if levels.glance_multiplier < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "levels.glance_multiplier",
                reason: "must not be negative",
            });
        }
        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new()
    }
}
