//! Effect pipeline: turns a base value into a delivered damage or healing
//! instance.
//!
//! The stages always run in this order:
//!
//! 1. base value ([`BaseValue`])
//! 2. attacker multipliers, or the snapshot's captured multiplier
//! 3. mitigation (armor for physical, partial resist for magic)
//! 4. target multipliers and flat bonus damage
//! 5. outcome roll, cost refund when the effect did not land
//! 6. crit / glance / block adjustments, then the target's post-outcome
//!    damage modifiers
//! 7. clamp at zero, then callbacks (`on_resolved`, dealt hooks, taken hooks)
//! 8. threat, metrics and the target's health pool
//!
//! Travelling effects run stages 1-4 at launch and the rest on arrival.

mod formula;
mod instance;
mod pipeline;

pub use formula::{BaseContext, BaseFn, BaseValue};
pub use instance::{EffectFn, EffectInstance, ModifierMode, ResolvedEffect, Snapshot, ThreatFn};
pub(crate) use pipeline::{Delivery, InstanceSpec};
