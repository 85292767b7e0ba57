//! Packed component identity.
//!
//! A [`TypeKey`] packs a component type id together with an optional relation
//! target into one `u64`:
//!
//! ```text
//! bits  0..16  component id
//! bits 16..32  target generation
//! bits 32..64  target index
//! ```
//!
//! Numeric order on the packed value is total, so sorted key lists give
//! canonical archetype signatures.

// Field extraction truncates on purpose.
#![allow(clippy::cast_possible_truncation)]

use std::fmt;

use crate::identity::Identity;

/// Dense id assigned to a component type by a registry.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, PartialOrd, Ord)]
pub struct ComponentId(u16);

impl ComponentId {
    /// Id reserved for the implicit [`Entity`](crate::Entity) component.
    pub const ENTITY: Self = Self(0);

    /// Creates a component id from its raw value.
    #[must_use]
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Returns the raw value as an index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

/// A component type, optionally bound to a relation target.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, PartialOrd, Ord)]
pub struct TypeKey(u64);

impl TypeKey {
    /// Key of the implicit identity component every entity carries.
    pub const ENTITY: Self = Self::plain(ComponentId::ENTITY);

    /// Packs a component id with a relation target.
    #[must_use]
    pub const fn new(component: ComponentId, target: Identity) -> Self {
        Self(
            component.0 as u64 | (target.generation as u64) << 16 | (target.index as u64) << 32,
        )
    }

    /// Packs a component id with no target.
    #[must_use]
    pub const fn plain(component: ComponentId) -> Self {
        Self::new(component, Identity::NONE)
    }

    /// Packs a component id with the wildcard target.
    #[must_use]
    pub const fn any_target(component: ComponentId) -> Self {
        Self::new(component, Identity::ANY)
    }

    /// Rebuilds a key from its packed representation.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the packed representation.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Returns the component id portion.
    #[must_use]
    pub const fn component(self) -> ComponentId {
        ComponentId(self.0 as u16)
    }

    /// Returns the relation target, or [`Identity::NONE`] for plain keys.
    #[must_use]
    pub const fn target(self) -> Identity {
        Identity::new((self.0 >> 32) as u32, (self.0 >> 16) as u16)
    }

    /// True iff the target index is nonzero.
    #[must_use]
    pub const fn is_relation(self) -> bool {
        self.0 >> 32 != 0
    }

    /// True iff the target is [`Identity::ANY`].
    #[must_use]
    pub const fn is_wildcard(self) -> bool {
        self.target().is_any()
    }

    /// Same component, different target.
    #[must_use]
    pub const fn with_target(self, target: Identity) -> Self {
        Self::new(self.component(), target)
    }

    /// Projects this key onto its component type only.
    #[must_use]
    pub const fn wildcard(self) -> WildcardKey {
        WildcardKey(self.component())
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let component = self.component().raw();
        if self.is_relation() {
            write!(f, "TypeKey({component} -> {})", self.target())
        } else {
            write!(f, "TypeKey({component})")
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A type key with its target erased.
///
/// Two keys share a wildcard iff they share a component id, whatever their
/// targets are.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
pub struct WildcardKey(ComponentId);

impl WildcardKey {
    /// Returns the component id this wildcard stands for.
    #[must_use]
    pub const fn component(self) -> ComponentId {
        self.0
    }

    /// True iff `key` is an instance of this wildcard.
    #[must_use]
    pub const fn matches(self, key: TypeKey) -> bool {
        key.component().0 == self.0.0
    }
}

impl From<TypeKey> for WildcardKey {
    fn from(key: TypeKey) -> Self {
        key.wildcard()
    }
}
