//! Archetype tables.
//!
//! A [`Table`] holds every entity whose signature is exactly its sorted set of
//! type keys. Rows are dense: removal swaps the last row into the hole, and
//! the caller is told which identity moved so it can fix that entity's meta.

use std::collections::HashMap;
use std::fmt;

use tessera_foundation::{Entity, Error, Identity, Result, TypeKey, Value};

use crate::column::{Column, TypedColumn, new_column};
use crate::component::{Component, ComponentRegistry};

/// Dense table id. Table 0 is the archetype every entity spawns into.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(u32);

impl TableId {
    /// The spawn archetype, holding only the implicit [`Entity`](tessera_foundation::Entity) key.
    pub const EMPTY: Self = Self(0);

    /// Converts a table-list index into an id.
    ///
    /// # Errors
    ///
    /// Returns `CapacityExceeded` if `index` does not fit the id space.
    pub(crate) fn try_from_index(index: usize) -> Result<Self> {
        u32::try_from(index)
            .map(Self)
            .map_err(|_| Error::capacity_exceeded("tables"))
    }

    /// Returns the id as an index into the world's table list.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Memoized neighbours of a table for one type key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TableEdge {
    /// Table reached by adding the key.
    pub add: Option<TableId>,
    /// Table reached by removing the key.
    pub remove: Option<TableId>,
}

/// Columnar storage for one archetype.
pub struct Table {
    id: TableId,
    types: Box<[TypeKey]>,
    columns: Vec<Box<dyn Column>>,
    identities: Vec<Identity>,
    edges: HashMap<TypeKey, TableEdge>,
}

impl Table {
    /// Creates an empty table for a sorted, deduplicated signature.
    ///
    /// # Errors
    ///
    /// Returns `Unregistered` if a key's component id has no registration.
    pub(crate) fn new(
        id: TableId,
        types: Vec<TypeKey>,
        registry: &ComponentRegistry,
        capacity: usize,
    ) -> Result<Self> {
        debug_assert!(types.windows(2).all(|w| w[0] < w[1]), "signature must be sorted");

        let columns = types
            .iter()
            .map(|key| {
                registry
                    .info(key.component())
                    .map(|info| (info.new_column)(capacity))
                    .ok_or_else(|| Error::unregistered("<unknown component id>"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id,
            types: types.into_boxed_slice(),
            columns,
            identities: Vec::with_capacity(capacity),
            edges: HashMap::new(),
        })
    }

    /// Creates the spawn archetype, whose only key is [`TypeKey::ENTITY`].
    pub(crate) fn root(capacity: usize) -> Self {
        Self {
            id: TableId::EMPTY,
            types: Box::new([TypeKey::ENTITY]),
            columns: vec![new_column::<Entity>(capacity)],
            identities: Vec::with_capacity(capacity),
            edges: HashMap::new(),
        }
    }

    /// Returns this table's id.
    #[must_use]
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Returns the sorted signature.
    #[must_use]
    pub fn types(&self) -> &[TypeKey] {
        &self.types
    }

    /// Returns the identity stored at each row.
    #[must_use]
    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Returns true if `key` is part of the signature.
    #[must_use]
    pub fn contains(&self, key: TypeKey) -> bool {
        self.types.binary_search(&key).is_ok()
    }

    fn column_index(&self, key: TypeKey) -> Option<usize> {
        self.types.binary_search(&key).ok()
    }

    /// Returns the typed column for `key`.
    #[must_use]
    pub fn column<T: Component>(&self, key: TypeKey) -> Option<&[T]> {
        let column = self.columns.get(self.column_index(key)?)?;
        column
            .as_any()
            .downcast_ref::<TypedColumn<T>>()
            .map(TypedColumn::as_slice)
    }

    /// Returns the typed column for `key`, mutably.
    pub fn column_mut<T: Component>(&mut self, key: TypeKey) -> Option<&mut [T]> {
        self.typed_column_mut::<T>(key).map(TypedColumn::as_mut_slice)
    }

    /// Returns the value of `key` at `row`.
    #[must_use]
    pub fn get<T: Component>(&self, key: TypeKey, row: usize) -> Option<&T> {
        self.column::<T>(key)?.get(row)
    }

    /// Returns the value of `key` at `row`, mutably.
    pub fn get_mut<T: Component>(&mut self, key: TypeKey, row: usize) -> Option<&mut T> {
        self.column_mut::<T>(key)?.get_mut(row)
    }

    pub(crate) fn typed_column_mut<T: Component>(
        &mut self,
        key: TypeKey,
    ) -> Option<&mut TypedColumn<T>> {
        let index = self.column_index(key)?;
        self.columns[index]
            .as_any_mut()
            .downcast_mut::<TypedColumn<T>>()
    }

    pub(crate) fn column_dyn_mut(&mut self, key: TypeKey) -> Option<&mut dyn Column> {
        let index = self.column_index(key)?;
        Some(self.columns[index].as_mut())
    }

    /// Appends `identity` and returns its row.
    ///
    /// Only the identity column grows; the caller fills every component
    /// column for the new row before the next structural change.
    pub(crate) fn append(&mut self, identity: Identity) -> usize {
        self.identities.push(identity);
        self.identities.len() - 1
    }

    /// Removes `row` from every column, dropping its values.
    ///
    /// Returns the identity that moved into `row`, or `None` if `row` was the
    /// last one.
    pub(crate) fn swap_remove(&mut self, row: usize) -> Option<Identity> {
        for column in &mut self.columns {
            column.swap_remove(row);
        }
        self.identities.swap_remove(row);
        self.identities.get(row).copied()
    }

    /// Moves the entity at `from_row` of `from` into a fresh row of `to`.
    ///
    /// Values for keys both tables share are moved; values for keys only
    /// `from` has are dropped. Keys only `to` has are left for the caller to
    /// fill. Returns the new row and the identity that moved into `from_row`.
    pub(crate) fn migrate(
        identity: Identity,
        from_row: usize,
        from: &mut Table,
        to: &mut Table,
    ) -> (usize, Option<Identity>) {
        debug_assert_eq!(from.identities[from_row], identity);

        let new_row = to.append(identity);
        for (index, key) in from.types.iter().enumerate() {
            let source = &mut from.columns[index];
            match to.column_index(*key) {
                Some(target) => source.move_row(from_row, to.columns[target].as_mut()),
                None => source.swap_remove(from_row),
            }
        }

        from.identities.swap_remove(from_row);
        (new_row, from.identities.get(from_row).copied())
    }

    /// Returns the edge slot for `key`, creating an empty one on first use.
    pub(crate) fn get_edge(&mut self, key: TypeKey) -> &mut TableEdge {
        self.edges.entry(key).or_default()
    }

    /// Returns the memoized edge for `key`, if one was ever recorded.
    #[must_use]
    pub fn edge(&self, key: TypeKey) -> Option<TableEdge> {
        self.edges.get(&key).copied()
    }

    /// Describes every component of the entity at `row`.
    #[must_use]
    pub fn snapshot(&self, row: usize) -> Vec<(TypeKey, Value)> {
        self.types
            .iter()
            .zip(&self.columns)
            .map(|(key, column)| (*key, column.snapshot(row)))
            .collect()
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("id", &self.id)
            .field("types", &self.types)
            .field("rows", &self.identities.len())
            .field("edges", &self.edges.len())
            .finish()
    }
}

/// Borrows two distinct tables mutably.
pub(crate) fn pair_mut(tables: &mut [Table], a: TableId, b: TableId) -> (&mut Table, &mut Table) {
    let (a, b) = (a.index(), b.index());
    assert_ne!(a, b, "cannot migrate within one table");
    if a < b {
        let (left, right) = tables.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = tables.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}
