//! Cached queries.
//!
//! A [`Query`] is created once per canonical [`Mask`] and keeps the list of
//! matching tables current: the world appends each newly created table that
//! satisfies the mask, so a query never rescans.

use tessera_foundation::{Error, Result, TypeKey};

use crate::index::GraphIndex;
use crate::mask::{CompiledMask, Mask};
use crate::table::TableId;

/// Dense query id, stable for the lifetime of the world.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryId(u32);

impl QueryId {
    pub(crate) fn try_from_index(index: usize) -> Result<Self> {
        u32::try_from(index)
            .map(Self)
            .map_err(|_| Error::capacity_exceeded("queries"))
    }

    /// Returns the id as an index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A mask bound to its live list of matching tables.
#[derive(Debug)]
pub struct Query {
    id: QueryId,
    mask: Mask,
    compiled: CompiledMask,
    tables: Vec<TableId>,
}

impl Query {
    pub(crate) fn new(id: QueryId, mask: Mask, compiled: CompiledMask, tables: Vec<TableId>) -> Self {
        Self {
            id,
            mask,
            compiled,
            tables,
        }
    }

    /// Returns this query's id.
    #[must_use]
    pub fn id(&self) -> QueryId {
        self.id
    }

    /// Returns the canonical mask this query was created for.
    #[must_use]
    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Returns the matching tables in discovery order.
    #[must_use]
    pub fn tables(&self) -> &[TableId] {
        &self.tables
    }

    pub(crate) fn matches(&self, types: &[TypeKey], index: &GraphIndex) -> bool {
        self.compiled.matches(types, index)
    }

    pub(crate) fn add_table(&mut self, table: TableId) {
        debug_assert!(!self.tables.contains(&table));
        self.tables.push(table);
    }
}
