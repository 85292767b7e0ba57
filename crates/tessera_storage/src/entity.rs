//! Identity allocation and per-entity location records.
//!
//! The [`IdentityAllocator`] hands out generational identities. Released
//! identities queue up in FIFO order with their generation already bumped,
//! so the oldest vacated slot is reused first.

use std::collections::VecDeque;

use tessera_foundation::Identity;

use crate::table::TableId;

/// Issues and reclaims generational identities.
#[derive(Debug, Clone, Default)]
pub struct IdentityAllocator {
    /// Identities ready for reuse, generation already incremented.
    free: VecDeque<Identity>,
    /// Highest index minted so far. Index 0 is never minted.
    minted: u32,
}

impl IdentityAllocator {
    /// Creates an allocator that has minted nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a reusable identity, or mints a fresh index with generation 1.
    ///
    /// # Panics
    ///
    /// Panics if the index space is exhausted. The largest index is reserved
    /// for [`Identity::ANY`].
    pub fn allocate(&mut self) -> Identity {
        if let Some(identity) = self.free.pop_front() {
            return identity;
        }
        assert!(self.minted < u32::MAX - 1, "entity index space exhausted");
        self.minted += 1;
        Identity::new(self.minted, 1)
    }

    /// Returns `identity`'s slot to the pool with the next generation.
    pub fn release(&mut self, identity: Identity) {
        self.free.push_back(identity.next_generation());
    }

    /// Number of identities waiting for reuse.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Number of distinct indices minted so far.
    #[must_use]
    pub fn minted(&self) -> u32 {
        self.minted
    }
}

/// Where a live entity's row lives.
///
/// A slot whose `identity` is [`Identity::NONE`] is vacant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityMeta {
    /// The identity currently occupying this slot.
    pub identity: Identity,
    /// The table holding the entity's row.
    pub table: TableId,
    /// The row within that table.
    pub row: usize,
}
