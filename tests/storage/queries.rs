//! Integration tests for masks and cached queries
//!
//! Tests has/not/any matching, relation wildcards, cache reuse, and
//! incremental table retrofitting.

use std::collections::HashSet;

use proptest::prelude::*;
use tessera_foundation::Identity;
use tessera_storage::{Mask, World};

use crate::fixtures::{Frozen, Likes, Position, Velocity, likes, setup};

fn entities_of(world: &mut World, mask: Mask) -> HashSet<Identity> {
    let query = world.get_or_create_query(mask).unwrap();
    world.query_entities(query).into_iter().collect()
}

// =============================================================================
// Plain Masks
// =============================================================================

#[test]
fn has_matches_exactly_the_holders() {
    let (mut world, keys) = setup();
    let a = world.spawn().identity();
    let b = world.spawn().identity();
    let _c = world.spawn().identity();
    world.add_component(keys.position, a, Position { x: 1 }).unwrap();
    world.add_component(keys.position, b, Position { x: 2 }).unwrap();
    world.add_component(keys.velocity, b, Velocity { dx: 1 }).unwrap();

    let found = entities_of(&mut world, Mask::new().has(keys.position));
    assert_eq!(found, HashSet::from([a, b]));
}

#[test]
fn not_excludes_tables() {
    let (mut world, keys) = setup();
    let a = world.spawn().identity();
    let b = world.spawn().identity();
    world.add_component(keys.position, a, Position { x: 1 }).unwrap();
    world.add_component(keys.position, b, Position { x: 2 }).unwrap();
    world.add_component(keys.frozen, b, Frozen).unwrap();

    let found = entities_of(&mut world, Mask::new().has(keys.position).not(keys.frozen));
    assert_eq!(found, HashSet::from([a]));
}

#[test]
fn any_requires_one_of() {
    let (mut world, keys) = setup();
    let a = world.spawn().identity();
    let b = world.spawn().identity();
    let c = world.spawn().identity();
    world.add_component(keys.position, a, Position { x: 1 }).unwrap();
    world.add_component(keys.velocity, b, Velocity { dx: 1 }).unwrap();
    world.add_component(keys.frozen, c, Frozen).unwrap();

    let found = entities_of(
        &mut world,
        Mask::new().any(keys.position).any(keys.velocity),
    );
    assert_eq!(found, HashSet::from([a, b]));
}

#[test]
fn empty_mask_matches_everything() {
    let (mut world, keys) = setup();
    let a = world.spawn().identity();
    let b = world.spawn().identity();
    world.add_component(keys.position, a, Position { x: 1 }).unwrap();

    let found = entities_of(&mut world, Mask::new());
    assert_eq!(found, HashSet::from([a, b]));
}

#[test]
fn dead_entities_are_not_matched() {
    let (mut world, keys) = setup();
    let a = world.spawn().identity();
    let b = world.spawn().identity();
    world.add_component(keys.position, a, Position { x: 1 }).unwrap();
    world.add_component(keys.position, b, Position { x: 2 }).unwrap();
    world.despawn(a);

    let found = entities_of(&mut world, Mask::new().has(keys.position));
    assert_eq!(found, HashSet::from([b]));
}

// =============================================================================
// Relation Wildcards
// =============================================================================

#[test]
fn wildcard_has_matches_any_target() {
    let (mut world, keys) = setup();
    let alice = world.spawn().identity();
    let bob = world.spawn().identity();
    let carol = world.spawn().identity();
    world.add_component(likes(&world, bob), alice, Likes(1)).unwrap();
    world.add_component(likes(&world, alice), carol, Likes(1)).unwrap();
    world.add_component(keys.position, bob, Position { x: 0 }).unwrap();

    let any = likes(&world, Identity::ANY);
    let found = entities_of(&mut world, Mask::new().has(any));
    assert_eq!(found, HashSet::from([alice, carol]));
}

#[test]
fn wildcard_not_excludes_any_target() {
    let (mut world, keys) = setup();
    let alice = world.spawn().identity();
    let bob = world.spawn().identity();
    world.add_component(keys.position, alice, Position { x: 0 }).unwrap();
    world.add_component(keys.position, bob, Position { x: 0 }).unwrap();
    world.add_component(likes(&world, bob), alice, Likes(1)).unwrap();

    let any = likes(&world, Identity::ANY);
    let found = entities_of(&mut world, Mask::new().has(keys.position).not(any));
    assert_eq!(found, HashSet::from([bob]));
}

#[test]
fn wildcard_any_is_satisfied_by_a_relation() {
    let (mut world, keys) = setup();
    let alice = world.spawn().identity();
    let bob = world.spawn().identity();
    let _carol = world.spawn().identity();
    world.add_component(likes(&world, bob), alice, Likes(1)).unwrap();
    world.add_component(keys.frozen, bob, Frozen).unwrap();

    let any = likes(&world, Identity::ANY);
    let found = entities_of(&mut world, Mask::new().any(any).any(keys.frozen));
    assert_eq!(found, HashSet::from([alice, bob]));
}

#[test]
fn specific_relation_matches_only_that_target() {
    let (mut world, _) = setup();
    let alice = world.spawn().identity();
    let bob = world.spawn().identity();
    let carol = world.spawn().identity();
    world.add_component(likes(&world, bob), alice, Likes(1)).unwrap();
    world.add_component(likes(&world, carol), bob, Likes(1)).unwrap();

    let likes_carol = likes(&world, carol);
    let found = entities_of(&mut world, Mask::new().has(likes_carol));
    assert_eq!(found, HashSet::from([bob]));
}

// =============================================================================
// Cache
// =============================================================================

#[test]
fn same_mask_returns_same_query() {
    let (mut world, keys) = setup();
    let first = world
        .get_or_create_query(Mask::new().has(keys.position).not(keys.frozen))
        .unwrap();
    let second = world
        .get_or_create_query(Mask::new().not(keys.frozen).has(keys.position))
        .unwrap();
    let third = world
        .get_or_create_query(
            Mask::new()
                .has(keys.position)
                .has(keys.position)
                .not(keys.frozen),
        )
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first, third);
    assert_eq!(world.info().queries, 1);
}

#[test]
fn different_masks_get_different_queries() {
    let (mut world, keys) = setup();
    let has = world.get_or_create_query(Mask::new().has(keys.position)).unwrap();
    let not = world.get_or_create_query(Mask::new().not(keys.position)).unwrap();
    let any = world.get_or_create_query(Mask::new().any(keys.position)).unwrap();

    assert_ne!(has, not);
    assert_ne!(has, any);
    assert_ne!(not, any);
    assert_eq!(world.info().queries, 3);
}

#[test]
fn pooled_mask_is_recycled_on_cache_hit() {
    let (mut world, keys) = setup();
    world.get_or_create_query(Mask::new().has(keys.position)).unwrap();

    let mask = world.mask().has(keys.position);
    world.get_or_create_query(mask).unwrap();

    let recycled = world.mask();
    assert!(recycled.is_empty());
}

#[test]
fn query_mask_is_canonical() {
    let (mut world, keys) = setup();
    let id = world.get_or_create_query(Mask::new().has(keys.velocity).has(keys.position)).unwrap();
    let query = world.query(id).unwrap();
    assert_eq!(query.mask().has_types(), &[keys.position, keys.velocity]);
    assert_eq!(query.id(), id);
}

// =============================================================================
// Incremental Maintenance
// =============================================================================

#[test]
fn new_tables_join_existing_queries() {
    let (mut world, keys) = setup();
    let query = world.get_or_create_query(Mask::new().has(keys.position)).unwrap();
    assert!(world.query(query).unwrap().tables().is_empty());

    let a = world.spawn().identity();
    world.add_component(keys.position, a, Position { x: 1 }).unwrap();
    world.add_component(keys.velocity, a, Velocity { dx: 1 }).unwrap();

    assert_eq!(world.query(query).unwrap().tables().len(), 2);
    assert_eq!(world.query_entities(query), vec![a]);

    let again = world.get_or_create_query(Mask::new().has(keys.position)).unwrap();
    assert_eq!(again, query);
    assert_eq!(world.info().queries, 1);
}

#[test]
fn non_matching_tables_stay_out() {
    let (mut world, keys) = setup();
    let query = world.get_or_create_query(Mask::new().has(keys.position).not(keys.frozen)).unwrap();

    let a = world.spawn().identity();
    world.add_component(keys.frozen, a, Frozen).unwrap();
    world.add_component(keys.position, a, Position { x: 1 }).unwrap();

    assert!(world.query(query).unwrap().tables().is_empty());
}

#[test]
fn relation_tables_join_wildcard_queries() {
    let (mut world, _) = setup();
    let any = likes(&world, Identity::ANY);
    let query = world.get_or_create_query(Mask::new().has(any)).unwrap();

    let alice = world.spawn().identity();
    let bob = world.spawn().identity();
    world.add_component(likes(&world, bob), alice, Likes(1)).unwrap();

    assert_eq!(world.query_entities(query), vec![alice]);
}

// =============================================================================
// Iteration
// =============================================================================

#[test]
fn run_visits_every_match() {
    let (mut world, keys) = setup();
    let spawned: Vec<Identity> = (0..4).map(|_| world.spawn().identity()).collect();
    for (i, e) in spawned.iter().enumerate() {
        let x = i32::try_from(i).unwrap();
        world.add_component(keys.position, *e, Position { x }).unwrap();
    }
    world.add_component(keys.velocity, spawned[0], Velocity { dx: 10 }).unwrap();

    let query = world.get_or_create_query(Mask::new().has(keys.position)).unwrap();
    let position = keys.position;
    world
        .run(query, |world, identity| {
            world.get_component::<Position>(position, identity).unwrap().x += 100;
        })
        .unwrap();

    for (i, e) in spawned.iter().enumerate() {
        let x = i32::try_from(i).unwrap() + 100;
        assert_eq!(world.component::<Position>(keys.position, *e), Ok(&Position { x }));
    }
}

#[test]
fn despawn_all_with_clears_holders() {
    let (mut world, keys) = setup();
    let a = world.spawn().identity();
    let b = world.spawn().identity();
    let c = world.spawn().identity();
    world.add_component(keys.frozen, a, Frozen).unwrap();
    world.add_component(keys.frozen, b, Frozen).unwrap();
    world.add_component(keys.position, b, Position { x: 0 }).unwrap();

    world.despawn_all_with(keys.frozen).unwrap();

    assert!(!world.is_alive(a));
    assert!(!world.is_alive(b));
    assert!(world.is_alive(c));
    assert!(!world.is_locked());
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #[test]
    fn query_matches_brute_force(
        plan in prop::collection::vec((any::<bool>(), any::<bool>(), any::<bool>()), 1..30),
        query_first in any::<bool>()
    ) {
        let (mut world, keys) = setup();
        let mask = || Mask::new().has(keys.position).not(keys.frozen);
        let early = query_first.then(|| world.get_or_create_query(mask()).unwrap());

        let mut expected = HashSet::new();
        for (position, velocity, frozen) in plan {
            let e = world.spawn().identity();
            if position {
                world.add_component(keys.position, e, Position { x: 0 }).unwrap();
            }
            if velocity {
                world.add_component(keys.velocity, e, Velocity { dx: 0 }).unwrap();
            }
            if frozen {
                world.add_component(keys.frozen, e, Frozen).unwrap();
            }
            if position && !frozen {
                expected.insert(e);
            }
        }

        let query = world.get_or_create_query(mask()).unwrap();
        if let Some(early) = early {
            prop_assert_eq!(early, query);
        }
        let found: HashSet<Identity> = world.query_entities(query).into_iter().collect();
        prop_assert_eq!(found, expected);
    }
}
