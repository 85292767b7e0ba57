//! Denormalized lookups over the table set.
//!
//! Every index here is derived from table signatures and entity membership and
//! is updated incrementally: when a table is created and when relation
//! components come and go.

use std::collections::{BTreeSet, HashMap, HashSet};

use tessera_foundation::{ComponentId, Identity, TypeKey, WildcardKey};

use crate::table::TableId;

#[derive(Debug, Default)]
pub(crate) struct GraphIndex {
    /// Tables whose signature contains the key.
    tables_by_key: HashMap<TypeKey, Vec<TableId>>,
    /// Relation keys pointing at each target, for the despawn cascade.
    keys_by_target: HashMap<Identity, BTreeSet<TypeKey>>,
    /// Every relation key ever seen in a signature, by component type.
    relations_by_component: HashMap<ComponentId, HashSet<TypeKey>>,
    /// Entities holding some instance of a component type.
    holders: HashMap<WildcardKey, BTreeSet<Identity>>,
}

impl GraphIndex {
    pub(crate) fn register_table(&mut self, table: TableId, types: &[TypeKey]) {
        for key in types {
            self.tables_by_key.entry(*key).or_default().push(table);
            if key.is_relation() {
                self.keys_by_target
                    .entry(key.target())
                    .or_default()
                    .insert(*key);
                self.relations_by_component
                    .entry(key.component())
                    .or_default()
                    .insert(*key);
            }
        }
    }

    pub(crate) fn tables_with(&self, key: TypeKey) -> &[TableId] {
        self.tables_by_key
            .get(&key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub(crate) fn relation_keys(&self, component: ComponentId) -> Option<&HashSet<TypeKey>> {
        self.relations_by_component.get(&component)
    }

    /// Removes and returns every relation key that targets `target`.
    pub(crate) fn take_keys_targeting(&mut self, target: Identity) -> BTreeSet<TypeKey> {
        self.keys_by_target.remove(&target).unwrap_or_default()
    }

    pub(crate) fn note_holder(&mut self, key: TypeKey, identity: Identity) {
        self.holders.entry(key.wildcard()).or_default().insert(identity);
    }

    /// Drops `identity` from the holders of `key`'s component type.
    ///
    /// This happens on any removal of that type, even if the entity still
    /// holds the same relation toward another target.
    pub(crate) fn forget_holder(&mut self, key: TypeKey, identity: Identity) {
        if let Some(set) = self.holders.get_mut(&key.wildcard()) {
            set.remove(&identity);
        }
    }

    pub(crate) fn holders(&self, wildcard: WildcardKey) -> impl Iterator<Item = Identity> + '_ {
        self.holders.get(&wildcard).into_iter().flatten().copied()
    }
}
