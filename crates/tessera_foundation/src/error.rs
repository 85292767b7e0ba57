//! Error types for the Tessera store.
//!
//! Every failure is a local contract violation reported synchronously to the
//! caller. Nothing here is retryable.

use thiserror::Error;

use crate::identity::Identity;
use crate::type_key::TypeKey;

/// The main error type for Tessera operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self { kind }
    }

    /// Creates a dead or stale identity error.
    #[must_use]
    pub const fn not_alive(identity: Identity) -> Self {
        Self::new(ErrorKind::NotAlive(identity))
    }

    /// Creates a duplicate component error.
    #[must_use]
    pub const fn already_present(identity: Identity, key: TypeKey) -> Self {
        Self::new(ErrorKind::AlreadyPresent { identity, key })
    }

    /// Creates a missing component error.
    #[must_use]
    pub const fn not_present(identity: Identity, key: TypeKey) -> Self {
        Self::new(ErrorKind::NotPresent { identity, key })
    }

    /// Creates a generation mismatch error.
    #[must_use]
    pub const fn stale_reference(requested: Identity, found: Identity) -> Self {
        Self::new(ErrorKind::StaleReference { requested, found })
    }

    /// Creates a component type mismatch error.
    #[must_use]
    pub const fn type_mismatch(key: TypeKey, expected: &'static str, actual: &'static str) -> Self {
        Self::new(ErrorKind::TypeMismatch {
            key,
            expected,
            actual,
        })
    }

    /// Creates an unregistered component type error.
    #[must_use]
    pub const fn unregistered(type_name: &'static str) -> Self {
        Self::new(ErrorKind::Unregistered(type_name))
    }

    /// Creates an unbalanced unlock error.
    #[must_use]
    pub const fn not_locked() -> Self {
        Self::new(ErrorKind::NotLocked)
    }

    /// Creates an id-space exhaustion error.
    #[must_use]
    pub const fn capacity_exceeded(what: &'static str) -> Self {
        Self::new(ErrorKind::CapacityExceeded(what))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The identity is dead, or was never allocated.
    #[error("entity not alive: {0:?}")]
    NotAlive(Identity),

    /// The key is already part of the entity's signature.
    #[error("component {key:?} already present on {identity:?}")]
    AlreadyPresent {
        /// The entity addressed.
        identity: Identity,
        /// The key that was added twice.
        key: TypeKey,
    },

    /// The key is not part of the entity's signature.
    #[error("component {key:?} not present on {identity:?}")]
    NotPresent {
        /// The entity addressed.
        identity: Identity,
        /// The key that was missing.
        key: TypeKey,
    },

    /// The slot's current identity disagrees with the requested one.
    #[error("stale entity reference: requested {requested:?}, found {found:?}")]
    StaleReference {
        /// The identity the caller passed.
        requested: Identity,
        /// The identity currently stored for that index.
        found: Identity,
    },

    /// A value's type does not match the type registered for the key.
    #[error("type mismatch for {key:?}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The key addressed.
        key: TypeKey,
        /// Name of the registered type.
        expected: &'static str,
        /// Name of the type supplied.
        actual: &'static str,
    },

    /// The component type was never registered.
    #[error("component type not registered: {0}")]
    Unregistered(&'static str),

    /// `unlock` was called without a matching `lock`.
    #[error("unlock called while not locked")]
    NotLocked,

    /// A dense id space ran out.
    #[error("capacity exceeded: too many {0}")]
    CapacityExceeded(&'static str),
}

/// Result type alias using Tessera's Error.
pub type Result<T> = std::result::Result<T, Error>;
