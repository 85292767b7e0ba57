//! Integration tests for entity lifecycle
//!
//! Tests spawning, despawning, generational reuse, and stale handles.

use proptest::prelude::*;
use tessera_foundation::{Entity, Identity, TypeKey};
use tessera_storage::{StorageConfig, TableId, World};

use crate::fixtures::{Position, Velocity, setup};

// =============================================================================
// Spawning
// =============================================================================

#[test]
fn spawned_entity_is_alive() {
    let mut world = World::new();
    let entity = world.spawn();

    assert!(world.is_alive(entity.identity()));
    assert_eq!(world.entity_count(), 1);
}

#[test]
fn spawned_entity_is_not_a_sentinel() {
    let mut world = World::new();
    let entity = world.spawn();

    assert_ne!(entity, Entity::NONE);
    assert_ne!(entity, Entity::ANY);
    assert_eq!(entity.identity(), Identity::new(1, 1));
}

#[test]
fn spawned_entity_starts_in_spawn_table() {
    let mut world = World::new();
    let entity = world.spawn().identity();

    let location = world.location(entity).unwrap();
    assert_eq!(location.table, TableId::EMPTY);
    assert_eq!(location.row, 0);
}

#[test]
fn spawned_entity_carries_its_own_identity() {
    let mut world = World::new();
    let entity = world.spawn();

    let components = world.get_components(entity.identity()).unwrap();
    assert_eq!(components.len(), 1);
    assert_eq!(components[0].0, TypeKey::ENTITY);
    assert_eq!(
        world.component::<Entity>(TypeKey::ENTITY, entity.identity()),
        Ok(&entity)
    );
}

#[test]
fn sentinels_are_never_alive() {
    let mut world = World::new();
    world.spawn();
    assert!(!world.is_alive(Identity::NONE));
    assert!(!world.is_alive(Identity::ANY));
}

// =============================================================================
// Despawning
// =============================================================================

#[test]
fn despawned_entity_is_not_alive() {
    let mut world = World::new();
    let entity = world.spawn().identity();
    world.despawn(entity);

    assert!(!world.is_alive(entity));
    assert_eq!(world.entity_count(), 0);
    assert!(world.location(entity).is_none());
}

#[test]
fn despawn_twice_is_a_no_op() {
    let mut world = World::new();
    let a = world.spawn().identity();
    let b = world.spawn().identity();
    world.despawn(a);
    world.despawn(a);

    assert!(world.is_alive(b));
    assert_eq!(world.entity_count(), 1);
    assert_eq!(world.info().free_identities, 1);
}

#[test]
fn despawn_fixes_moved_row() {
    let mut world = World::new();
    let a = world.spawn().identity();
    let b = world.spawn().identity();
    let c = world.spawn().identity();

    world.despawn(a);

    assert_eq!(world.location(c).unwrap().row, 0);
    assert_eq!(world.location(b).unwrap().row, 1);
    assert_eq!(
        world.table(TableId::EMPTY).unwrap().identities(),
        &[c, b]
    );
}

#[test]
fn despawn_of_never_allocated_identity_is_ignored() {
    let mut world = World::new();
    world.despawn(Identity::new(9_000, 1));
    world.despawn(Identity::NONE);
    assert_eq!(world.entity_count(), 0);
}

// =============================================================================
// Generational Reuse
// =============================================================================

#[test]
fn reused_index_gets_next_generation() {
    let mut world = World::new();
    let old = world.spawn().identity();
    world.despawn(old);
    let new = world.spawn().identity();

    assert_eq!(new.index, old.index);
    assert_eq!(new.generation, old.generation + 1);
    assert!(!world.is_alive(old));
    assert!(world.is_alive(new));
}

#[test]
fn stale_handle_cannot_read_new_occupant() {
    let (mut world, keys) = setup();
    let old = world.spawn().identity();
    world.despawn(old);
    let new = world.spawn().identity();
    world.add_component(keys.position, new, Position { x: 1 }).unwrap();

    assert!(world.get_component::<Position>(keys.position, old).is_err());
    assert!(!world.has_component(keys.position, old));
    assert!(world.add_component(keys.velocity, old, Velocity { dx: 1 }).is_err());
}

#[test]
fn concrete_lifecycle_scenario() {
    let (mut world, keys) = setup();

    let e1 = world.spawn().identity();
    world.add_component(keys.position, e1, Position { x: 1 }).unwrap();
    world.add_component(keys.velocity, e1, Velocity { dx: 2 }).unwrap();
    world.despawn(e1);
    let e2 = world.spawn().identity();

    assert_eq!(e2.index, e1.index);
    assert_eq!(e2.generation, e1.generation + 1);
    assert!(!world.is_alive(e1));
    assert!(world.is_alive(e2));
    assert!(!world.has_component(keys.position, e2));
}

// =============================================================================
// Configuration and Info
// =============================================================================

#[test]
fn info_tracks_counts() {
    let (mut world, keys) = setup();
    let a = world.spawn().identity();
    let b = world.spawn().identity();
    world.add_component(keys.position, a, Position { x: 0 }).unwrap();
    world.despawn(b);

    let info = world.info();
    assert_eq!(info.live_entities, 1);
    assert_eq!(info.free_identities, 1);
    assert_eq!(info.archetypes, 2);
    assert_eq!(info.queries, 0);
    assert_eq!(info.pending_operations, 0);
}

#[test]
fn custom_config_is_kept() {
    let config = StorageConfig::new()
        .with_initial_entity_capacity(4)
        .with_table_row_capacity(16)
        .with_log_transitions(true);
    let mut world = World::with_config(config.clone());
    for _ in 0..10 {
        world.spawn();
    }

    assert_eq!(world.config(), &config);
    assert_eq!(world.info().allocated_meta, 16);
    assert_eq!(world.entity_count(), 10);
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #[test]
    fn alive_until_despawned(ops in prop::collection::vec(0_usize..8, 1..120)) {
        let mut world = World::new();
        let mut live: Vec<Identity> = Vec::new();
        let mut dead: Vec<Identity> = Vec::new();

        for op in ops {
            if op < 5 || live.is_empty() {
                live.push(world.spawn().identity());
            } else {
                let victim = live.swap_remove(op % live.len());
                world.despawn(victim);
                dead.push(victim);
            }

            for id in &live {
                prop_assert!(world.is_alive(*id));
                let meta = world.location(*id).unwrap();
                let table = world.table(meta.table).unwrap();
                prop_assert_eq!(table.identities()[meta.row], *id);
            }
            for id in &dead {
                prop_assert!(!world.is_alive(*id));
            }
            prop_assert_eq!(world.entity_count(), live.len());
        }
    }
}
