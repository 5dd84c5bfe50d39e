//! Small integer handles into the per-combatant tables.
//!
//! Every registered object (unit, spell, aura, periodic effect) is addressed by
//! a copyable handle. Handles for unit-owned objects carry the owning unit so a
//! lookup never needs a global registry.

use std::fmt;

/// Unique identifier for a combatant participating in a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitId(pub u16);

impl UnitId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

macro_rules! owned_handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name {
            /// Unit that owns the object.
            pub unit: UnitId,
            /// Position in the owner's table.
            pub index: u16,
        }

        impl $name {
            pub const fn new(unit: UnitId, index: u16) -> Self {
                Self { unit, index }
            }

            #[inline]
            pub const fn slot(self) -> usize {
                self.index as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}{}", self.unit, $prefix, self.index)
            }
        }
    };
}

owned_handle!(
    /// Handle to an ability definition registered on its caster.
    SpellId,
    "/spell:"
);
owned_handle!(
    /// Handle to an aura registered on the unit that carries it.
    AuraId,
    "/aura:"
);
owned_handle!(
    /// Handle to a periodic effect registered on its caster.
    DotId,
    "/dot:"
);

/// Identifier of a non-ability source of resource flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OtherAction {
    /// Passive regeneration ticks.
    Regen,
    /// Resource generated by dealing auto-attack damage.
    DamageDealt,
    /// Resource generated by taking damage.
    DamageTaken,
    /// Cost returned after a non-landing outcome.
    Refund,
    /// Resource granted by the run setup (starting values, external scripts).
    Setup,
}

/// Metrics key for anything that can deal damage or move resources.
///
/// Mirrors an ability's public identity rather than its handle so that several
/// handles (e.g. ranks or tagged variants) may be reported under one key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionId {
    Spell { id: u32, tag: u8 },
    Other(OtherAction),
}

impl ActionId {
    pub const fn spell(id: u32) -> Self {
        Self::Spell { id, tag: 0 }
    }

    pub const fn tagged(id: u32, tag: u8) -> Self {
        Self::Spell { id, tag }
    }

    pub const fn other(action: OtherAction) -> Self {
        Self::Other(action)
    }

    pub const fn is_other(&self) -> bool {
        matches!(self, Self::Other(_))
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spell { id, tag: 0 } => write!(f, "{{SpellID: {id}}}"),
            Self::Spell { id, tag } => write!(f, "{{SpellID: {id}, Tag: {tag}}}"),
            Self::Other(other) => write!(f, "{{OtherID: {other}}}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_display_with_owner_prefix() {
        let aura = AuraId::new(UnitId(2), 7);
        assert_eq!(aura.to_string(), "#2/aura:7");
        assert_eq!(aura.slot(), 7);
    }

    #[test]
    fn action_ids_format_tag_only_when_present() {
        assert_eq!(ActionId::spell(47450).to_string(), "{SpellID: 47450}");
        assert_eq!(ActionId::tagged(47450, 1).to_string(), "{SpellID: 47450, Tag: 1}");
        assert_eq!(
            ActionId::other(OtherAction::Refund).to_string(),
            "{OtherID: Refund}"
        );
    }
}
