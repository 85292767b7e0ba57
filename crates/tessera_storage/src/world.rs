//! The archetype graph.
//!
//! [`World`] owns every table, the identity-to-row map, the graph indices, the
//! query cache and the deferred-operation buffer. Structural changes walk
//! memoized table edges: adding or removing one key moves the entity to the
//! neighbouring table, creating that table the first time the edge is needed.
//!
//! # Deferral
//!
//! While [`World::lock`] is held, `despawn`, `add_component` and
//! `remove_component` are queued instead of applied. The final
//! [`World::unlock`] replays them in submission order, skipping any whose
//! entity died in the meantime.
//!
//! # Type and World Entities
//!
//! [`World::type_entity`] stands in for a Rust type so relations can target
//! it. Elements are singletons stored as [`Element`] components on one
//! world entity, spawned the first time an element is added.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;

use tracing::{debug, trace, warn};

use tessera_foundation::{ComponentId, Entity, Error, Identity, Result, TypeKey, Value};

use crate::component::{Component, ComponentRegistry, Element};
use crate::config::StorageConfig;
use crate::deferred::{OperationBuffer, TableOperation};
use crate::entity::{EntityMeta, IdentityAllocator};
use crate::index::GraphIndex;
use crate::mask::{CompiledMask, Mask};
use crate::pool::{MaskPool, ScratchPool};
use crate::query::{Query, QueryId};
use crate::table::{Table, TableId, pair_mut};

/// Point-in-time counters describing a world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldInfo {
    /// Entities currently alive.
    pub live_entities: usize,
    /// Released identities waiting for reuse.
    pub free_identities: usize,
    /// Length of the entity metadata array.
    pub allocated_meta: usize,
    /// Tables created so far, including the spawn table.
    pub archetypes: usize,
    /// Distinct cached queries.
    pub queries: usize,
    /// Operations buffered behind the lock.
    pub pending_operations: usize,
    /// Components held by the world entity.
    pub elements: usize,
}

#[derive(Clone, Copy)]
enum Transition {
    Add,
    Remove,
}

/// Archetype-based entity store.
pub struct World {
    config: StorageConfig,
    registry: ComponentRegistry,
    allocator: IdentityAllocator,
    meta: Vec<EntityMeta>,
    live: usize,
    tables: Vec<Table>,
    signatures: HashMap<Box<[TypeKey]>, TableId>,
    index: GraphIndex,
    queries: Vec<Query>,
    query_cache: HashMap<Mask, QueryId>,
    deferred: OperationBuffer,
    masks: MaskPool,
    identity_lists: ScratchPool<Identity>,
    table_lists: ScratchPool<TableId>,
    type_entities: HashMap<TypeId, Identity>,
    world_entity: Option<Identity>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates a world with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StorageConfig::default())
    }

    /// Creates a world with the given configuration.
    #[must_use]
    pub fn with_config(config: StorageConfig) -> Self {
        let root = Table::root(config.table_row_capacity);
        let mut index = GraphIndex::default();
        index.register_table(root.id(), root.types());

        let mut signatures = HashMap::new();
        signatures.insert(Box::from(root.types()), root.id());

        Self {
            meta: vec![EntityMeta::default(); config.initial_entity_capacity.max(1)],
            config,
            registry: ComponentRegistry::new(),
            allocator: IdentityAllocator::new(),
            live: 0,
            tables: vec![root],
            signatures,
            index,
            queries: Vec::new(),
            query_cache: HashMap::new(),
            deferred: OperationBuffer::default(),
            masks: MaskPool::default(),
            identity_lists: ScratchPool::default(),
            table_lists: ScratchPool::default(),
            type_entities: HashMap::new(),
            world_entity: None,
        }
    }

    /// Returns the configuration this world was built with.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    // =========================================================================
    // Component Types
    // =========================================================================

    /// Registers a component type. Registering twice returns the same id.
    ///
    /// # Errors
    ///
    /// Returns `CapacityExceeded` once every component id is taken.
    pub fn register<T: Component>(&mut self) -> Result<ComponentId> {
        let before = self.registry.len();
        let id = self.registry.register::<T>()?;
        if self.registry.len() > before {
            debug!(component = type_name::<T>(), id = id.raw(), "registered component");
        }
        Ok(id)
    }

    /// Returns the component registry.
    #[must_use]
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Builds the key for `T` targeting `target`.
    ///
    /// Pass [`Identity::NONE`] for a plain component and [`Identity::ANY`] for
    /// a relation wildcard.
    ///
    /// # Errors
    ///
    /// Returns `Unregistered` if `T` was never registered.
    pub fn key<T: Component>(&self, target: Identity) -> Result<TypeKey> {
        Ok(TypeKey::new(self.registry.require::<T>()?, target))
    }

    // =========================================================================
    // Entity Lifecycle
    // =========================================================================

    /// Creates an entity in the spawn table.
    ///
    /// Spawning is never deferred, even while locked.
    pub fn spawn(&mut self) -> Entity {
        let identity = self.allocator.allocate();
        let table = &mut self.tables[TableId::EMPTY.index()];
        let row = table.append(identity);
        if let Some(column) = table.typed_column_mut::<Entity>(TypeKey::ENTITY) {
            column.push(Entity::from(identity));
        }

        self.ensure_meta(identity);
        self.meta[slot(identity)] = EntityMeta {
            identity,
            table: TableId::EMPTY,
            row,
        };
        self.live += 1;
        trace!(entity = %identity, "spawn");
        Entity::from(identity)
    }

    /// Destroys an entity and every relation that targets it.
    ///
    /// Despawning a dead or stale identity does nothing.
    pub fn despawn(&mut self, identity: Identity) {
        let Ok(meta) = self.live_meta(identity) else {
            return;
        };
        if self.deferred.is_locked() {
            self.deferred.push(TableOperation::Despawn(identity));
            return;
        }

        let table = &mut self.tables[meta.table.index()];
        for key in table.types() {
            self.index.forget_holder(*key, identity);
        }
        if let Some(moved) = table.swap_remove(meta.row) {
            self.meta[slot(moved)].row = meta.row;
        }
        self.meta[slot(identity)] = EntityMeta::default();
        self.allocator.release(identity);
        self.live -= 1;
        trace!(entity = %identity, "despawn");

        self.cascade(identity);
    }

    /// Removes every relation key targeting `target` from every holder.
    fn cascade(&mut self, target: Identity) {
        let keys = self.index.take_keys_targeting(target);
        if keys.is_empty() {
            return;
        }

        let mut holders = self.identity_lists.get();
        for key in keys {
            self.index.forget_holder(key, target);
            for table in self.index.tables_with(key) {
                holders.extend_from_slice(self.tables[table.index()].identities());
            }
            for holder in holders.drain(..) {
                if let Err(err) = self.remove_component(key, holder) {
                    warn!(error = %err, target = %target, "cascade removal failed");
                }
            }
        }
        self.identity_lists.put(holders);
    }

    /// Despawns every entity holding `key`.
    ///
    /// # Errors
    ///
    /// Returns `CapacityExceeded` if a new query cannot be created, otherwise
    /// the first failure reported while replaying the despawns.
    pub fn despawn_all_with(&mut self, key: TypeKey) -> Result<()> {
        let mask = self.masks.get().has(key);
        let query = self.get_or_create_query(mask)?;
        self.run(query, |world, identity| world.despawn(identity))
    }

    /// Returns the entity standing for the Rust type `T`, spawning it on first use.
    ///
    /// Relations target a type through this entity. If it was despawned, a
    /// fresh entity takes its place.
    pub fn type_entity<T: 'static>(&mut self) -> Entity {
        let type_id = TypeId::of::<T>();
        if let Some(identity) = self
            .type_entities
            .get(&type_id)
            .copied()
            .filter(|identity| self.is_alive(*identity))
        {
            return Entity::from(identity);
        }

        let entity = self.spawn();
        self.type_entities.insert(type_id, entity.identity());
        debug!(ty = type_name::<T>(), entity = %entity.identity(), "type entity");
        entity
    }

    /// Returns true if `identity` refers to a live entity.
    #[must_use]
    pub fn is_alive(&self, identity: Identity) -> bool {
        self.live_meta(identity).is_ok()
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.live
    }

    /// Returns where a live entity's row is stored.
    #[must_use]
    pub fn location(&self, identity: Identity) -> Option<EntityMeta> {
        self.live_meta(identity).ok()
    }

    // =========================================================================
    // Structural Changes
    // =========================================================================

    /// Adds a component (or relation, if `key` has a target) to an entity.
    ///
    /// # Errors
    ///
    /// - `TypeMismatch` / `Unregistered` if `key` was not registered for `T`.
    /// - `NotAlive` if the entity, or the relation target, is not alive.
    /// - `AlreadyPresent` if the entity's signature already contains `key`.
    pub fn add_component<T: Component>(
        &mut self,
        key: TypeKey,
        identity: Identity,
        value: T,
    ) -> Result<()> {
        self.registry.check::<T>(key)?;
        let meta = self.check_add(key, identity)?;
        if self.deferred.is_locked() {
            self.deferred.push(TableOperation::Add {
                identity,
                key,
                value: Box::new(value),
            });
            return Ok(());
        }

        let to = self.transition_add(key, identity, meta)?;
        let column = self.tables[to.index()]
            .typed_column_mut::<T>(key)
            .ok_or_else(|| Error::not_present(identity, key))?;
        column.push(value);
        Ok(())
    }

    /// Removes a component from an entity.
    ///
    /// # Errors
    ///
    /// - `NotAlive` if the entity is not alive.
    /// - `NotPresent` if the entity's signature does not contain `key`.
    pub fn remove_component(&mut self, key: TypeKey, identity: Identity) -> Result<()> {
        let meta = self.live_meta(identity)?;
        if !self.tables[meta.table.index()].contains(key) {
            return Err(Error::not_present(identity, key));
        }
        if self.deferred.is_locked() {
            self.deferred.push(TableOperation::Remove { identity, key });
            return Ok(());
        }

        self.index.forget_holder(key, identity);
        let to = self.neighbour(meta.table, key, Transition::Remove)?;
        self.migrate(identity, meta, to);
        Ok(())
    }

    fn check_add(&self, key: TypeKey, identity: Identity) -> Result<EntityMeta> {
        let meta = self.live_meta(identity)?;
        if key.is_relation() && !self.is_alive(key.target()) {
            return Err(Error::not_alive(key.target()));
        }
        if self.tables[meta.table.index()].contains(key) {
            return Err(Error::already_present(identity, key));
        }
        Ok(meta)
    }

    /// Moves the entity to the table with `key` added. The caller writes the value.
    fn transition_add(&mut self, key: TypeKey, identity: Identity, meta: EntityMeta) -> Result<TableId> {
        self.index.note_holder(key, identity);
        let to = self.neighbour(meta.table, key, Transition::Add)?;
        self.migrate(identity, meta, to);
        Ok(to)
    }

    fn apply_deferred_add(
        &mut self,
        key: TypeKey,
        identity: Identity,
        value: Box<dyn Any>,
    ) -> Result<()> {
        let info = self
            .registry
            .info(key.component())
            .ok_or_else(|| Error::unregistered("<unknown component id>"))?;
        if (*value).type_id() != info.type_id {
            return Err(Error::type_mismatch(key, info.name, "<deferred value>"));
        }
        let expected = info.name;

        let meta = self.check_add(key, identity)?;
        let to = self.transition_add(key, identity, meta)?;
        let column = self.tables[to.index()]
            .column_dyn_mut(key)
            .ok_or_else(|| Error::not_present(identity, key))?;
        column
            .push_any(value)
            .map_err(|_| Error::type_mismatch(key, expected, "<deferred value>"))
    }

    /// Follows (or builds) the edge from `from` across `key`.
    fn neighbour(&mut self, from: TableId, key: TypeKey, transition: Transition) -> Result<TableId> {
        let edge = *self.tables[from.index()].get_edge(key);
        let cached = match transition {
            Transition::Add => edge.add,
            Transition::Remove => edge.remove,
        };
        if let Some(to) = cached {
            return Ok(to);
        }

        let mut types = self.tables[from.index()].types().to_vec();
        match transition {
            Transition::Add => {
                let at = types.binary_search(&key).unwrap_or_else(|at| at);
                types.insert(at, key);
            }
            Transition::Remove => types.retain(|k| *k != key),
        }

        let to = match self.signatures.get(types.as_slice()) {
            Some(&to) => to,
            None => self.add_table(types)?,
        };

        match transition {
            Transition::Add => {
                self.tables[from.index()].get_edge(key).add = Some(to);
                self.tables[to.index()].get_edge(key).remove = Some(from);
            }
            Transition::Remove => {
                self.tables[from.index()].get_edge(key).remove = Some(to);
                self.tables[to.index()].get_edge(key).add = Some(from);
            }
        }
        Ok(to)
    }

    /// Creates a table and retrofits it into every matching query.
    fn add_table(&mut self, types: Vec<TypeKey>) -> Result<TableId> {
        let id = TableId::try_from_index(self.tables.len())?;
        let table = Table::new(id, types, &self.registry, self.config.table_row_capacity)?;

        self.index.register_table(id, table.types());
        for query in &mut self.queries {
            if query.matches(table.types(), &self.index) {
                query.add_table(id);
            }
        }
        self.signatures.insert(Box::from(table.types()), id);

        debug!(table = id.index(), types = ?table.types(), "new archetype");
        self.tables.push(table);
        Ok(id)
    }

    fn migrate(&mut self, identity: Identity, meta: EntityMeta, to: TableId) {
        let (source, target) = pair_mut(&mut self.tables, meta.table, to);
        let (row, moved) = Table::migrate(identity, meta.row, source, target);
        if let Some(moved) = moved {
            self.meta[slot(moved)].row = meta.row;
        }
        self.meta[slot(identity)] = EntityMeta {
            identity,
            table: to,
            row,
        };

        if self.config.log_transitions {
            trace!(
                entity = %identity,
                from = meta.table.index(),
                to = to.index(),
                "migrate"
            );
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Returns a mutable reference to an entity's component.
    ///
    /// The reference borrows the world, so no structural change can happen
    /// while it is held.
    ///
    /// # Errors
    ///
    /// - `NotAlive` if the entity is not alive.
    /// - `StaleReference` if the entity's row holds a different identity.
    /// - `NotPresent` if the entity does not have `key`.
    /// - `TypeMismatch` / `Unregistered` if `key` was not registered for `T`.
    pub fn get_component<T: Component>(&mut self, key: TypeKey, identity: Identity) -> Result<&mut T> {
        self.registry.check::<T>(key)?;
        let meta = self.locate(identity)?;
        self.tables[meta.table.index()]
            .get_mut::<T>(key, meta.row)
            .ok_or_else(|| Error::not_present(identity, key))
    }

    /// Returns a shared reference to an entity's component.
    ///
    /// # Errors
    ///
    /// Same as [`World::get_component`].
    pub fn component<T: Component>(&self, key: TypeKey, identity: Identity) -> Result<&T> {
        self.registry.check::<T>(key)?;
        let meta = self.locate(identity)?;
        self.tables[meta.table.index()]
            .get::<T>(key, meta.row)
            .ok_or_else(|| Error::not_present(identity, key))
    }

    /// Returns true if the entity is alive and its signature contains `key`.
    #[must_use]
    pub fn has_component(&self, key: TypeKey, identity: Identity) -> bool {
        self.live_meta(identity)
            .is_ok_and(|meta| self.tables[meta.table.index()].contains(key))
    }

    /// Returns the first target the entity relates to through `key`'s type.
    ///
    /// Returns [`Entity::NONE`] when the entity holds no such relation.
    ///
    /// # Errors
    ///
    /// Returns `NotAlive` if the entity is not alive.
    pub fn get_target(&self, key: TypeKey, identity: Identity) -> Result<Entity> {
        let meta = self.locate(identity)?;
        Ok(self.relations_of(meta, key.component())
            .next()
            .map_or(Entity::NONE, Entity::from))
    }

    /// Returns every target the entity relates to through `key`'s type.
    ///
    /// With [`Identity::ANY`] as the entity, returns every entity registered
    /// as a holder of `key`'s component type instead.
    ///
    /// # Errors
    ///
    /// Returns `NotAlive` if the entity is neither alive nor the wildcard.
    pub fn get_targets(&self, key: TypeKey, identity: Identity) -> Result<Vec<Entity>> {
        if identity.is_any() {
            return Ok(self.index.holders(key.wildcard()).map(Entity::from).collect());
        }
        let meta = self.locate(identity)?;
        Ok(self.relations_of(meta, key.component()).map(Entity::from).collect())
    }

    fn relations_of(&self, meta: EntityMeta, component: ComponentId) -> impl Iterator<Item = Identity> + '_ {
        self.tables[meta.table.index()]
            .types()
            .iter()
            .filter(move |key| key.is_relation() && key.component() == component)
            .map(|key| key.target())
    }

    /// Describes every component of an entity, the implicit [`Entity`] included.
    ///
    /// # Errors
    ///
    /// Returns `NotAlive` if the entity is not alive.
    pub fn get_components(&self, identity: Identity) -> Result<Vec<(TypeKey, Value)>> {
        let meta = self.locate(identity)?;
        Ok(self.tables[meta.table.index()].snapshot(meta.row))
    }

    /// Returns a table by id.
    #[must_use]
    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.tables.get(id.index())
    }

    /// Returns every table in creation order.
    #[must_use]
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    // =========================================================================
    // Elements
    // =========================================================================

    /// Stores a world element, registering [`Element<T>`] on first use.
    ///
    /// # Errors
    ///
    /// - `AlreadyPresent` if an element of type `T` is already stored.
    /// - `CapacityExceeded` if `Element<T>` cannot be registered.
    pub fn add_element<T: 'static>(&mut self, value: T) -> Result<()> {
        self.register::<Element<T>>()?;
        let key = self.key::<Element<T>>(Identity::NONE)?;
        let world = self.world_entity();
        self.add_component(key, world, Element(value))
    }

    /// Returns true if an element of type `T` is stored.
    #[must_use]
    pub fn has_element<T: 'static>(&self) -> bool {
        match (self.world_entity, self.key::<Element<T>>(Identity::NONE)) {
            (Some(world), Ok(key)) => self.has_component(key, world),
            _ => false,
        }
    }

    /// Returns the element of type `T`.
    ///
    /// # Errors
    ///
    /// Returns `Unregistered` or `NotPresent` if no such element was added.
    pub fn element<T: 'static>(&self) -> Result<&T> {
        let (key, world) = self.element_slot::<T>()?;
        self.component::<Element<T>>(key, world).map(|element| &element.0)
    }

    /// Returns the element of type `T`, mutably.
    ///
    /// # Errors
    ///
    /// Same as [`World::element`].
    pub fn element_mut<T: 'static>(&mut self) -> Result<&mut T> {
        let (key, world) = self.element_slot::<T>()?;
        self.get_component::<Element<T>>(key, world)
            .map(|element| &mut element.0)
    }

    /// Stores `value`, overwriting any element of type `T` in place.
    ///
    /// Returns the previous element, if there was one.
    ///
    /// # Errors
    ///
    /// Same as [`World::add_element`] when no element was stored.
    pub fn replace_element<T: 'static>(&mut self, value: T) -> Result<Option<T>> {
        if self.has_element::<T>() {
            let slot = self.element_mut::<T>()?;
            return Ok(Some(std::mem::replace(slot, value)));
        }
        self.add_element(value)?;
        Ok(None)
    }

    /// Drops the element of type `T`.
    ///
    /// # Errors
    ///
    /// Returns `Unregistered` or `NotPresent` if no such element was added.
    pub fn remove_element<T: 'static>(&mut self) -> Result<()> {
        let (key, world) = self.element_slot::<T>()?;
        self.remove_component(key, world)
    }

    fn element_slot<T: 'static>(&self) -> Result<(TypeKey, Identity)> {
        let key = self.key::<Element<T>>(Identity::NONE)?;
        let world = self
            .world_entity
            .ok_or_else(|| Error::not_present(Identity::NONE, key))?;
        Ok((key, world))
    }

    fn world_entity(&mut self) -> Identity {
        if let Some(identity) = self.world_entity.filter(|identity| self.is_alive(*identity)) {
            return identity;
        }
        let identity = self.spawn().identity();
        self.world_entity = Some(identity);
        debug!(entity = %identity, "world entity");
        identity
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Takes an empty mask from the pool.
    pub fn mask(&mut self) -> Mask {
        self.masks.get()
    }

    /// Returns the query for `mask`, creating it on first request.
    ///
    /// Masks are compared in canonical form. On a cache hit the mask is
    /// returned to the pool.
    ///
    /// # Errors
    ///
    /// Returns `CapacityExceeded` if the query id space is exhausted.
    pub fn get_or_create_query(&mut self, mask: Mask) -> Result<QueryId> {
        let mask = mask.canonical();
        if let Some(&id) = self.query_cache.get(&mask) {
            self.masks.put(mask);
            return Ok(id);
        }
        let id = QueryId::try_from_index(self.queries.len())?;

        let compiled = CompiledMask::compile(&mask);
        let tables: Vec<TableId> = match compiled.first_has() {
            Some(key) => self
                .index
                .tables_with(key)
                .iter()
                .copied()
                .filter(|id| compiled.matches(self.tables[id.index()].types(), &self.index))
                .collect(),
            None => self
                .tables
                .iter()
                .filter(|table| compiled.matches(table.types(), &self.index))
                .map(Table::id)
                .collect(),
        };

        debug!(query = id.index(), tables = tables.len(), mask = ?mask, "new query");
        self.query_cache.insert(mask.clone(), id);
        self.queries.push(Query::new(id, mask, compiled, tables));
        Ok(id)
    }

    /// Returns a query by id.
    #[must_use]
    pub fn query(&self, id: QueryId) -> Option<&Query> {
        self.queries.get(id.index())
    }

    /// Collects the identities of every entity a query currently matches.
    #[must_use]
    pub fn query_entities(&self, id: QueryId) -> Vec<Identity> {
        self.query(id).map_or_else(Vec::new, |query| {
            query
                .tables()
                .iter()
                .flat_map(|table| self.tables[table.index()].identities().iter().copied())
                .collect()
        })
    }

    /// Calls `f` for every entity the query matches, with the world locked.
    ///
    /// Structural changes made by `f` are deferred and applied when the
    /// iteration ends. Only rows present when a table's turn starts are
    /// visited; entities spawned by `f` are not.
    ///
    /// # Errors
    ///
    /// Returns the first failure reported while replaying deferred operations.
    pub fn run<F>(&mut self, query: QueryId, mut f: F) -> Result<()>
    where
        F: FnMut(&mut World, Identity),
    {
        self.lock();
        let mut tables = self.table_lists.get();
        if let Some(query) = self.queries.get(query.index()) {
            tables.extend_from_slice(query.tables());
        }

        for table in &tables {
            let rows = self.tables[table.index()].len();
            for row in 0..rows {
                let Some(&identity) = self.tables[table.index()].identities().get(row) else {
                    break;
                };
                f(self, identity);
            }
        }

        self.table_lists.put(tables);
        self.unlock()
    }

    // =========================================================================
    // Deferral
    // =========================================================================

    /// Suppresses structural changes until the matching [`World::unlock`].
    pub fn lock(&mut self) {
        self.deferred.lock();
    }

    /// Returns true while at least one lock is held.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.deferred.is_locked()
    }

    /// Releases one lock. Releasing the last one replays deferred operations.
    ///
    /// Operations whose entity died before replay are skipped, as are
    /// relation adds whose target died. A failing operation is logged and
    /// replay continues.
    ///
    /// # Errors
    ///
    /// Returns `NotLocked` if no lock is held, otherwise the first replay failure.
    pub fn unlock(&mut self) -> Result<()> {
        if !self.deferred.unlock()? {
            return Ok(());
        }

        let mut first_error = None;
        for operation in self.deferred.take() {
            let identity = operation.identity();
            if !self.is_alive(identity) {
                trace!(entity = %identity, "skipping deferred operation for dead entity");
                continue;
            }
            if let Some(target) = operation
                .relation_target()
                .filter(|target| !self.is_alive(*target))
            {
                trace!(entity = %identity, target = %target, "skipping deferred relation to dead target");
                continue;
            }

            let result = match operation {
                TableOperation::Despawn(identity) => {
                    self.despawn(identity);
                    Ok(())
                }
                TableOperation::Add {
                    identity,
                    key,
                    value,
                } => self.apply_deferred_add(key, identity, value),
                TableOperation::Remove { identity, key } => self.remove_component(key, identity),
            };

            if let Err(err) = result {
                warn!(error = %err, entity = %identity, "deferred operation failed");
                first_error.get_or_insert(err);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Returns current counters.
    #[must_use]
    pub fn info(&self) -> WorldInfo {
        WorldInfo {
            live_entities: self.live,
            free_identities: self.allocator.free_count(),
            allocated_meta: self.meta.len(),
            archetypes: self.tables.len(),
            queries: self.queries.len(),
            pending_operations: self.deferred.len(),
            elements: self.world_entity.and_then(|world| self.location(world)).map_or(0, |meta| {
                self.tables[meta.table.index()]
                    .types()
                    .iter()
                    .filter(|key| **key != TypeKey::ENTITY)
                    .count()
            }),
        }
    }

    fn live_meta(&self, identity: Identity) -> Result<EntityMeta> {
        if identity.is_none() {
            return Err(Error::not_alive(identity));
        }
        match self.meta.get(slot(identity)) {
            Some(meta) if meta.identity == identity => Ok(*meta),
            _ => Err(Error::not_alive(identity)),
        }
    }

    /// Resolves a live entity and checks its row agrees with its meta.
    fn locate(&self, identity: Identity) -> Result<EntityMeta> {
        let meta = self.live_meta(identity)?;
        let found = self.tables[meta.table.index()]
            .identities()
            .get(meta.row)
            .copied()
            .unwrap_or_default();
        if found == identity {
            Ok(meta)
        } else {
            Err(Error::stale_reference(identity, found))
        }
    }

    fn ensure_meta(&mut self, identity: Identity) {
        let needed = slot(identity) + 1;
        if needed > self.meta.len() {
            let mut len = self.meta.len().max(1);
            while len < needed {
                len *= 2;
            }
            self.meta.resize(len, EntityMeta::default());
        }
    }
}

fn slot(identity: Identity) -> usize {
    identity.index as usize
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("info", &self.info())
            .field("components", &self.registry.len())
            .finish_non_exhaustive()
    }
}
