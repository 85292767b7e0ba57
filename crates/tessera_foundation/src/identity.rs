//! Generational entity identities.

use std::fmt;

/// Generational handle addressing one entity slot.
///
/// The generation increments every time an index is handed back to the
/// allocator, so a handle kept past its entity's despawn never matches the
/// slot's current occupant.
///
/// # Reserved values
/// - [`Identity::NONE`] (`0v0`) means "no entity" and is never allocated.
/// - [`Identity::ANY`] (`u32::MAX` index) is the relation wildcard used in
///   queries and lookups; it is never allocated either.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, PartialOrd, Ord)]
pub struct Identity {
    /// Index into entity metadata storage.
    pub index: u32,
    /// Generation counter for stale reference detection.
    pub generation: u16,
}

impl Identity {
    /// The "no entity" sentinel.
    pub const NONE: Self = Self::new(0, 0);

    /// The relation wildcard sentinel.
    pub const ANY: Self = Self::new(u32::MAX, 0);

    /// Creates an identity from its raw parts.
    #[must_use]
    pub const fn new(index: u32, generation: u16) -> Self {
        Self { index, generation }
    }

    /// Returns true if this is [`Identity::NONE`].
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.index == 0 && self.generation == 0
    }

    /// Returns true if this is [`Identity::ANY`].
    #[must_use]
    pub const fn is_any(self) -> bool {
        self.index == u32::MAX && self.generation == 0
    }

    /// Returns the identity the same slot will carry once this one dies.
    ///
    /// Generation zero is skipped on wrap so a recycled handle can never
    /// collide with [`Identity::NONE`].
    #[must_use]
    pub const fn next_generation(self) -> Self {
        let generation = match self.generation.wrapping_add(1) {
            0 => 1,
            g => g,
        };
        Self::new(self.index, generation)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "Identity(none)")
        } else if self.is_any() {
            write!(f, "Identity(any)")
        } else {
            write!(f, "Identity({}v{})", self.index, self.generation)
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "none")
        } else if self.is_any() {
            write!(f, "*")
        } else {
            write!(f, "{}v{}", self.index, self.generation)
        }
    }
}

/// Entity handle returned by spawning.
///
/// A thin wrapper over [`Identity`]. Every live entity also stores its own
/// `Entity` as an implicit component, which is why a freshly spawned entity
/// already reports one component.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, PartialOrd, Ord)]
pub struct Entity(Identity);

impl Entity {
    /// Handle that refers to no entity.
    pub const NONE: Self = Self(Identity::NONE);

    /// Wildcard handle matching any relation target.
    pub const ANY: Self = Self(Identity::ANY);

    /// Wraps an identity.
    #[must_use]
    pub const fn new(identity: Identity) -> Self {
        Self(identity)
    }

    /// Returns the underlying identity.
    #[must_use]
    pub const fn identity(self) -> Identity {
        self.0
    }

    /// Returns true if this is [`Entity::NONE`].
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0.is_none()
    }

    /// Returns true if this is [`Entity::ANY`].
    #[must_use]
    pub const fn is_any(self) -> bool {
        self.0.is_any()
    }
}

impl From<Identity> for Entity {
    fn from(identity: Identity) -> Self {
        Self(identity)
    }
}

impl From<Entity> for Identity {
    fn from(entity: Entity) -> Self {
        entity.0
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}
