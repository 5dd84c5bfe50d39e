use std::time::Duration;

use super::CooldownConfig;
use crate::time::SimTime;

/// Run-time charge bookkeeping of one ability.
///
/// Charges recharge one at a time; the timer starts when the first charge is
/// spent from a full set. Reads are pure: the number of available charges at
/// any time is derived from the stored state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CooldownState {
    config: Option<CooldownConfig>,
    charges: u32,
    /// When the next missing charge comes back; `NEVER` when full.
    recharge_at: SimTime,
}

impl CooldownState {
    pub fn new(config: Option<CooldownConfig>) -> Self {
        Self {
            config,
            charges: config.map_or(0, |c| c.charges),
            recharge_at: SimTime::NEVER,
        }
    }

    fn max_charges(&self) -> u32 {
        self.config.map_or(0, |c| c.charges)
    }

    /// Charges available at `now`.
    pub fn charges(&self, now: SimTime) -> u32 {
        let Some(config) = self.config else {
            return 0;
        };
        if self.charges >= config.charges || now < self.recharge_at {
            return self.charges;
        }
        let elapsed = now - self.recharge_at;
        let restored = if config.duration.is_zero() {
            config.charges
        } else {
            1 + (elapsed.as_nanos() / config.duration.as_nanos()) as u32
        };
        (self.charges + restored).min(config.charges)
    }

    pub fn is_ready(&self, now: SimTime) -> bool {
        self.config.is_none() || self.charges(now) > 0
    }

    /// Time until at least one charge is available.
    pub fn time_to_ready(&self, now: SimTime) -> Duration {
        if self.is_ready(now) {
            Duration::ZERO
        } else {
            now.until(self.recharge_at)
        }
    }

    /// Consumes a charge. Callers check [`is_ready`](Self::is_ready) first.
    pub fn consume(&mut self, now: SimTime) {
        let Some(config) = self.config else {
            return;
        };
        self.settle(now, config);
        if self.charges == 0 {
            return;
        }
        if self.charges == config.charges {
            self.recharge_at = now + config.duration;
        }
        self.charges -= 1;
    }

    /// Folds recharges that completed before `now` into the stored state.
    fn settle(&mut self, now: SimTime, config: CooldownConfig) {
        while self.charges < config.charges && now >= self.recharge_at {
            self.charges += 1;
            self.recharge_at = if self.charges < config.charges {
                self.recharge_at + config.duration
            } else {
                SimTime::NEVER
            };
        }
    }

    pub fn reset(&mut self) {
        self.charges = self.max_charges();
        self.recharge_at = SimTime::NEVER;
    }
}
