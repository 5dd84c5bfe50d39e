use std::sync::Arc;
use std::time::Duration;

use super::{AuraEffectFn, AuraFn, EffectHook, StackChange};
use crate::effect::EffectInstance;
use crate::error::InvariantViolation;
use crate::ids::{AuraId, UnitId};
use crate::sim::Simulation;
use crate::stats::BonusSource;
use crate::time::SimTime;

/// Passes of the end-of-iteration sweep before giving up on auras that keep
/// re-activating each other from `on_expire`.
const MAX_SWEEP_PASSES: usize = 8;

impl Simulation {
    // ========================================================================
    // Queries
    // ========================================================================

    pub fn is_aura_active(&self, aura: AuraId) -> bool {
        self.aura(aura).active
    }

    pub fn aura_stacks(&self, aura: AuraId) -> u32 {
        self.aura(aura).stacks
    }

    /// Remaining duration; `None` when inactive or permanent.
    pub fn aura_remaining(&self, aura: AuraId) -> Option<Duration> {
        self.aura(aura).remaining(self.now())
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Inactive → Active, or refreshes an already active aura.
    pub fn activate_aura(&mut self, id: AuraId) {
        if self.aura(id).active {
            self.refresh_aura(id);
            return;
        }
        let config = Arc::clone(&self.aura(id).config);

        if let Some(category) = config.category {
            if let Some(previous) = self.claim_exclusive(id, category) {
                if self.aura(previous).active {
                    self.expire_aura(previous);
                }
            }
        }

        let now = self.now();
        let aura = self.aura_mut(id);
        aura.active = true;
        aura.stacks = config.initial_stacks;
        aura.gained_at = now;
        aura.epoch += 1;
        aura.expiry_token += 1;
        aura.stats.gains += 1;
        aura.expires_at = config.duration.map_or(SimTime::NEVER, |d| now + d);

        let unit = self.unit_mut(id.unit);
        unit.active_auras.push(id.index);
        for (target, bonus) in &config.stat_bonuses {
            unit.stats.add_bonus(*target, BonusSource::Aura(id), *bonus);
        }

        self.schedule_expiry(id);
        if self.log_events() {
            tracing::debug!(time = %now, aura = %id, label = config.label, "aura gained");
        }
        if let Some(hook) = config.hooks.on_gain.clone() {
            hook(self, id);
        }
    }

    /// Resets the duration of an active aura and runs `on_refresh`.
    ///
    /// Inactive auras are activated instead.
    pub fn refresh_aura(&mut self, id: AuraId) {
        if !self.aura(id).active {
            self.activate_aura(id);
            return;
        }
        let config = Arc::clone(&self.aura(id).config);
        let now = self.now();
        let aura = self.aura_mut(id);
        aura.stats.refreshes += 1;
        if let Some(duration) = config.duration {
            aura.expires_at = now + duration;
            aura.expiry_token += 1;
            self.schedule_expiry(id);
        }
        if self.log_events() {
            tracing::debug!(time = %now, aura = %id, label = config.label, "aura refreshed");
        }
        if let Some(hook) = config.hooks.on_refresh.clone() {
            hook(self, id);
        }
    }

    /// Pushes back the expiry of an active, timed aura. Returns false when the
    /// aura is inactive or permanent.
    pub fn extend_aura(&mut self, id: AuraId, by: Duration) -> bool {
        let aura = self.aura_mut(id);
        if !aura.active || aura.expires_at.is_never() {
            return false;
        }
        aura.expires_at += by;
        aura.expiry_token += 1;
        self.schedule_expiry(id);
        true
    }

    /// Active → Inactive, running `on_expire`.
    ///
    /// Deactivating an inactive aura is a no-op counted as an invariant
    /// violation.
    pub fn deactivate_aura(&mut self, id: AuraId) {
        if !self.aura(id).active {
            self.record_violation(InvariantViolation::DoubleDeactivation(id));
            return;
        }
        self.expire_aura(id);
    }

    fn schedule_expiry(&mut self, id: AuraId) {
        let aura = self.aura(id);
        if aura.expires_at.is_never() {
            return;
        }
        let (at, token) = (aura.expires_at, aura.expiry_token);
        self.schedule_guarded(
            at,
            "aura expiry",
            move |sim| {
                let aura = sim.aura(id);
                aura.active && aura.expiry_token == token
            },
            move |sim| sim.expire_aura(id),
        );
    }

    /// Shared Active → Inactive path; the caller guarantees the aura is active.
    pub(crate) fn expire_aura(&mut self, id: AuraId) {
        let now = self.now();
        let aura = self.aura_mut(id);
        debug_assert!(aura.active, "expire_aura on inactive aura {id}");
        aura.active = false;
        aura.stacks = 0;
        aura.stats.expirations += 1;
        aura.stats.uptime += now - aura.gained_at;
        aura.expires_at = SimTime::NEVER;
        aura.expiry_token += 1;
        let config = Arc::clone(&aura.config);

        let unit = self.unit_mut(id.unit);
        unit.active_auras.retain(|index| *index != id.index);
        for slot in unit.exclusive.iter_mut() {
            if slot.holder == Some(id) {
                slot.holder = None;
            }
        }
        unit.stats.remove_source(BonusSource::Aura(id));

        if self.log_events() {
            tracing::debug!(time = %now, aura = %id, label = config.label, "aura expired");
        }
        if let Some(hook) = config.hooks.on_expire.clone() {
            hook(self, id);
        }
    }

    /// Makes `id` the holder of `category`, returning the previous holder.
    fn claim_exclusive(&mut self, id: AuraId, category: &'static str) -> Option<AuraId> {
        let unit = self.unit_mut(id.unit);
        let slot = unit.exclusive.iter_mut().find(|slot| slot.category == category)?;
        slot.holder.replace(id).filter(|previous| *previous != id)
    }

    /// Current holder of an exclusive category on `unit`.
    pub fn exclusive_holder(&self, unit: UnitId, category: &str) -> Option<AuraId> {
        self.unit(unit)
            .exclusive
            .iter()
            .find(|slot| slot.category == category)
            .and_then(|slot| slot.holder)
    }

    // ========================================================================
    // Stacks
    // ========================================================================

    /// Adds one stack; refused with `Capped` at the maximum.
    pub fn add_stack(&mut self, id: AuraId) -> StackChange {
        let aura = self.aura(id);
        if !aura.active {
            return StackChange::Inactive;
        }
        if aura.stacks >= aura.config.max_stacks {
            return StackChange::Capped;
        }
        let stacks = aura.stacks + 1;
        self.set_stacks(id, stacks)
    }

    /// Removes one stack; reaching zero deactivates the aura.
    pub fn remove_stack(&mut self, id: AuraId) -> StackChange {
        let aura = self.aura(id);
        if !aura.active {
            return StackChange::Inactive;
        }
        if aura.stacks == 0 {
            return StackChange::Unchanged;
        }
        let stacks = aura.stacks - 1;
        self.set_stacks(id, stacks)
    }

    /// Sets the stack count, clamped to `[0, max_stacks]`.
    ///
    /// Requests above the maximum are clamped, reported as `Capped` and
    /// counted as invariant violations. Dropping to zero deactivates.
    pub fn set_stacks(&mut self, id: AuraId, requested: u32) -> StackChange {
        let aura = self.aura(id);
        if !aura.active {
            return StackChange::Inactive;
        }
        let max = aura.config.max_stacks;
        let old = aura.stacks;
        let capped = requested > max;
        if capped {
            self.record_violation(InvariantViolation::StackOutOfBounds {
                aura: id,
                requested,
                max,
            });
        }
        let new = requested.min(max);
        if new == old {
            return if capped {
                StackChange::Capped
            } else {
                StackChange::Unchanged
            };
        }

        self.aura_mut(id).stacks = new;
        let config = Arc::clone(&self.aura(id).config);
        if self.log_events() {
            tracing::debug!(time = %self.now(), aura = %id, label = config.label, old, new, "aura stacks changed");
        }
        if let Some(hook) = config.hooks.on_stacks_change.clone() {
            hook(self, id, old, new);
        }
        if new == 0 && self.aura(id).active {
            self.expire_aura(id);
        }
        if capped {
            StackChange::Capped
        } else {
            StackChange::Changed { old, new }
        }
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Runs the `hook` listener of every active aura on `unit`.
    ///
    /// Listeners are collected first; an aura deactivated by an earlier
    /// listener in the same dispatch is skipped.
    pub(crate) fn dispatch_effect_hooks(
        &mut self,
        unit: UnitId,
        hook: EffectHook,
        instance: &EffectInstance,
    ) {
        let owner = self.unit(unit);
        let listeners: Vec<(AuraId, AuraEffectFn)> = owner
            .active_auras
            .iter()
            .filter_map(|index| {
                let aura = &owner.auras[*index as usize];
                aura.config
                    .hooks
                    .effect(hook)
                    .map(|f| (aura.id, Arc::clone(f)))
            })
            .collect();
        for (aura, listener) in listeners {
            if self.aura(aura).active {
                listener(self, aura, instance);
            }
        }
    }

    /// Runs the post-outcome modifiers of every active aura on the target of
    /// a damage instance, then clamps the amount at zero.
    pub(crate) fn apply_post_outcome_modifiers(&self, instance: &mut EffectInstance) {
        if instance.healing {
            return;
        }
        let target = self.unit(instance.target);
        for index in &target.active_auras {
            let aura = &target.auras[*index as usize];
            if let Some(modifier) = &aura.config.hooks.post_outcome_taken {
                modifier(self, aura.id, instance);
            }
        }
        instance.amount = instance.amount.max(0.0);
    }

    /// Runs `on_reset` of every registered aura, in registration order.
    pub(crate) fn run_aura_reset_hooks(&mut self) {
        let hooks: Vec<(AuraId, AuraFn)> = self
            .units()
            .iter()
            .flat_map(|unit| unit.auras.iter())
            .filter_map(|aura| {
                aura.config
                    .hooks
                    .on_reset
                    .as_ref()
                    .map(|f| (aura.id, Arc::clone(f)))
            })
            .collect();
        for (aura, hook) in hooks {
            hook(self, aura);
        }
    }

    /// Force-expires every active aura so `on_expire` reverts what `on_gain`
    /// applied.
    pub(crate) fn expire_all_auras(&mut self) {
        for _ in 0..MAX_SWEEP_PASSES {
            let active: Vec<AuraId> = self
                .units()
                .iter()
                .flat_map(|unit| {
                    unit.active_auras
                        .iter()
                        .rev()
                        .map(move |index| AuraId::new(unit.id, *index))
                })
                .collect();
            if active.is_empty() {
                return;
            }
            for id in active {
                if self.aura(id).active {
                    self.expire_aura(id);
                }
            }
        }
        tracing::warn!("auras still active after the end-of-iteration sweep");
    }
}
