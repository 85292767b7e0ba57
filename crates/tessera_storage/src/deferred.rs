//! Structural changes deferred while the world is locked.

use std::any::Any;
use std::fmt;

use tessera_foundation::{Error, Identity, Result, TypeKey};

/// A structural change waiting for the lock to drop.
pub(crate) enum TableOperation {
    Despawn(Identity),
    Add {
        identity: Identity,
        key: TypeKey,
        value: Box<dyn Any>,
    },
    Remove {
        identity: Identity,
        key: TypeKey,
    },
}

impl TableOperation {
    pub(crate) fn identity(&self) -> Identity {
        match self {
            Self::Despawn(identity)
            | Self::Add { identity, .. }
            | Self::Remove { identity, .. } => *identity,
        }
    }

    /// The relation target of an add, if its key is a relation.
    pub(crate) fn relation_target(&self) -> Option<Identity> {
        match self {
            Self::Add { key, .. } if key.is_relation() => Some(key.target()),
            _ => None,
        }
    }
}

impl fmt::Debug for TableOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Despawn(identity) => write!(f, "Despawn({identity:?})"),
            Self::Add { identity, key, .. } => write!(f, "Add({key:?} -> {identity:?})"),
            Self::Remove { identity, key } => write!(f, "Remove({key:?} -> {identity:?})"),
        }
    }
}

/// Counted lock plus the operations submitted while it was held.
#[derive(Debug, Default)]
pub(crate) struct OperationBuffer {
    depth: u32,
    operations: Vec<TableOperation>,
}

impl OperationBuffer {
    pub(crate) fn is_locked(&self) -> bool {
        self.depth > 0
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> u32 {
        self.depth
    }

    pub(crate) fn lock(&mut self) {
        self.depth += 1;
    }

    /// Drops one level of locking. Returns true when the lock is fully released.
    pub(crate) fn unlock(&mut self) -> Result<bool> {
        self.depth = self.depth.checked_sub(1).ok_or_else(Error::not_locked)?;
        Ok(self.depth == 0)
    }

    pub(crate) fn push(&mut self, operation: TableOperation) {
        self.operations.push(operation);
    }

    pub(crate) fn take(&mut self) -> Vec<TableOperation> {
        std::mem::take(&mut self.operations)
    }

    pub(crate) fn len(&self) -> usize {
        self.operations.len()
    }
}
