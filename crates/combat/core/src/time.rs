//! Continuous simulation clock.
//!
//! `SimTime` is an offset from the start of the current iteration. It wraps a
//! [`Duration`] so that ordering and arithmetic are exact; fractional seconds
//! only appear at the edges (configuration and travel-time computation).

use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::time::Duration;

/// Point on the simulation timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub Duration);

impl SimTime {
    pub const ZERO: Self = Self(Duration::ZERO);

    /// Sentinel used for permanent state ("never expires").
    pub const NEVER: Self = Self(Duration::MAX);

    pub const fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    /// Converts fractional seconds, clamping negative and non-finite input to zero.
    pub fn from_secs_f64(secs: f64) -> Self {
        Self(secs_to_duration(secs))
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0.as_secs_f64()
    }

    pub const fn as_duration(self) -> Duration {
        self.0
    }

    pub fn is_never(self) -> bool {
        self == Self::NEVER
    }

    /// Time left until `later`, zero if it already passed.
    pub fn until(self, later: SimTime) -> Duration {
        later.0.saturating_sub(self.0)
    }
}

/// Converts fractional seconds into a `Duration`, mapping invalid input to zero.
pub fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

impl Add<Duration> for SimTime {
    type Output = SimTime;

    fn add(self, rhs: Duration) -> SimTime {
        SimTime(self.0.saturating_add(rhs))
    }
}

impl AddAssign<Duration> for SimTime {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 = self.0.saturating_add(rhs);
    }
}

impl Sub<SimTime> for SimTime {
    type Output = Duration;

    fn sub(self, rhs: SimTime) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_never() {
            f.write_str("never")
        } else {
            write!(f, "{:.3}s", self.0.as_secs_f64())
        }
    }
}
