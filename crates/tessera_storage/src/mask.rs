//! Query predicates over table signatures.
//!
//! A [`Mask`] lists keys a table must have, must not have, and of which it
//! must have at least one. A key whose target is [`Identity::ANY`] stands for
//! "any relation of this component type".
//!
//! [`Identity::ANY`]: tessera_foundation::Identity::ANY

use tessera_foundation::{ComponentId, TypeKey};

use crate::index::GraphIndex;

/// A has / not / any predicate over type keys.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Mask {
    has: Vec<TypeKey>,
    not: Vec<TypeKey>,
    any: Vec<TypeKey>,
}

impl Mask {
    /// Creates an empty mask, which matches every table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `key`.
    #[must_use]
    pub fn has(mut self, key: TypeKey) -> Self {
        self.has.push(key);
        self
    }

    /// Excludes `key`.
    #[must_use]
    pub fn not(mut self, key: TypeKey) -> Self {
        self.not.push(key);
        self
    }

    /// Adds `key` to the at-least-one-of list.
    #[must_use]
    pub fn any(mut self, key: TypeKey) -> Self {
        self.any.push(key);
        self
    }

    /// Required keys.
    #[must_use]
    pub fn has_types(&self) -> &[TypeKey] {
        &self.has
    }

    /// Excluded keys.
    #[must_use]
    pub fn not_types(&self) -> &[TypeKey] {
        &self.not
    }

    /// At-least-one-of keys.
    #[must_use]
    pub fn any_types(&self) -> &[TypeKey] {
        &self.any
    }

    /// Returns true if all three lists are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.has.is_empty() && self.not.is_empty() && self.any.is_empty()
    }

    /// Empties all lists, keeping their allocations.
    pub fn clear(&mut self) {
        self.has.clear();
        self.not.clear();
        self.any.clear();
    }

    /// Sorts and deduplicates each list in place.
    pub fn canonicalize(&mut self) {
        for list in [&mut self.has, &mut self.not, &mut self.any] {
            list.sort_unstable();
            list.dedup();
        }
    }

    /// Returns the canonical form of this mask.
    ///
    /// Masks that differ only in insertion order or repeated keys share one
    /// canonical form.
    #[must_use]
    pub fn canonical(mut self) -> Self {
        self.canonicalize();
        self
    }
}

/// A mask split into plain keys and relation wildcards.
#[derive(Clone, Debug, Default)]
pub(crate) struct CompiledMask {
    has: Vec<TypeKey>,
    not: Vec<TypeKey>,
    any: Vec<TypeKey>,
    has_relations: Vec<ComponentId>,
    not_relations: Vec<ComponentId>,
    any_relations: Vec<ComponentId>,
}

fn partition(keys: &[TypeKey]) -> (Vec<TypeKey>, Vec<ComponentId>) {
    let mut plain = Vec::new();
    let mut wildcards = Vec::new();
    for key in keys {
        if key.is_wildcard() {
            wildcards.push(key.component());
        } else {
            plain.push(*key);
        }
    }
    (plain, wildcards)
}

impl CompiledMask {
    pub(crate) fn compile(mask: &Mask) -> Self {
        let (has, has_relations) = partition(&mask.has);
        let (not, not_relations) = partition(&mask.not);
        let (any, any_relations) = partition(&mask.any);
        Self {
            has,
            not,
            any,
            has_relations,
            not_relations,
            any_relations,
        }
    }

    /// The plain required key used to narrow candidate tables.
    pub(crate) fn first_has(&self) -> Option<TypeKey> {
        self.has.first().copied()
    }

    /// Tests a sorted signature against the mask.
    pub(crate) fn matches(&self, types: &[TypeKey], index: &GraphIndex) -> bool {
        let contains = |key: &TypeKey| types.binary_search(key).is_ok();
        let holds_relation = |component: &ComponentId| {
            index
                .relation_keys(*component)
                .is_some_and(|keys| types.iter().any(|key| keys.contains(key)))
        };

        if !self.has.iter().all(contains) {
            return false;
        }
        if self.not.iter().any(contains) {
            return false;
        }
        if !self.has_relations.iter().all(holds_relation) {
            return false;
        }
        if self.not_relations.iter().any(holds_relation) {
            return false;
        }

        let any_empty = self.any.is_empty() && self.any_relations.is_empty();
        any_empty || self.any.iter().any(contains) || self.any_relations.iter().any(holds_relation)
    }
}
