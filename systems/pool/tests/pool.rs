use std::collections::BTreeSet;

use glam::Vec3;
use gridcrawl_core::{BuildError, Conflict, PrefabKind, PrototypeKey, RepresentationId, Transform};
use gridcrawl_system_pool::{
    hooks, ObjectPool, Parent, PrewarmEntry, Prototype, PrototypeCatalog, PrototypeKind,
};

fn key(name: &str) -> PrototypeKey {
    PrototypeKey::new(name)
}

fn catalog() -> PrototypeCatalog {
    [
        Prototype::new(key("tile"), PrototypeKind::Tile).with_setup(hooks::clear_walls),
        Prototype::new(key("wall_gate"), PrototypeKind::Prefab(PrefabKind::WallForMovement))
            .with_pool_binding()
            .with_setup(hooks::reset_editor_state),
        Prototype::new(key("barrel"), PrototypeKind::Prefab(PrefabKind::Prop)),
    ]
    .into_iter()
    .collect()
}

#[test]
fn acquire_reuses_released_entries_in_fifo_order() {
    let mut pool = ObjectPool::new(catalog());
    let first = pool
        .acquire(&key("barrel"), Transform::IDENTITY, Parent::Prefabs)
        .expect("known prototype");
    let second = pool
        .acquire(&key("barrel"), Transform::IDENTITY, Parent::Prefabs)
        .expect("known prototype");

    pool.release(first).expect("first is active");
    pool.release(second).expect("second is active");

    let reused = pool
        .acquire(
            &key("barrel"),
            Transform::from_position(Vec3::new(2.0, 0.0, 3.0)),
            Parent::Prefabs,
        )
        .expect("known prototype");

    assert_eq!(reused, first, "oldest released entry must be reused first");
    assert_eq!(pool.instantiated_count(), 2, "no new instance should be created");
    let representation = pool.get(reused).expect("owned by pool");
    assert!(representation.is_active());
    assert_eq!(representation.parent(), Parent::Prefabs);
    assert_eq!(representation.transform().position, Vec3::new(2.0, 0.0, 3.0));
}

#[test]
fn queues_are_separated_per_prototype() {
    let mut pool = ObjectPool::new(catalog());
    let barrel = pool
        .acquire(&key("barrel"), Transform::IDENTITY, Parent::Prefabs)
        .expect("known prototype");
    pool.release(barrel).expect("active");

    let tile = pool
        .acquire(&key("tile"), Transform::IDENTITY, Parent::Layout)
        .expect("known prototype");

    assert_ne!(tile, barrel, "a tile must never be served from the barrel queue");
    assert_eq!(pool.inactive_count(&key("barrel")), 1);
    assert_eq!(pool.get(tile).map(|r| r.prototype().clone()), Some(key("tile")));
}

#[test]
fn setup_runs_once_per_acquire_including_fresh_instances() {
    let mut pool = ObjectPool::new(catalog());
    let id = pool
        .acquire(&key("wall_gate"), Transform::IDENTITY, Parent::Prefabs)
        .expect("known prototype");
    assert_eq!(pool.get(id).map(|r| r.initializations()), Some(1));

    pool.get_mut(id)
        .expect("owned by pool")
        .set_editor_overlay(true);
    pool.release(id).expect("active");
    let again = pool
        .acquire(&key("wall_gate"), Transform::IDENTITY, Parent::Prefabs)
        .expect("known prototype");

    assert_eq!(again, id);
    let representation = pool.get(again).expect("owned by pool");
    assert_eq!(representation.initializations(), 2);
    assert!(representation.pool_bound());
    assert!(
        !representation.editor_overlay(),
        "setup hook should reset editor state on reuse"
    );
}

#[test]
fn missing_prototype_is_reported_as_lookup_failure() {
    let mut pool = ObjectPool::new(catalog());

    let result = pool.acquire(&key("dragon"), Transform::IDENTITY, Parent::Prefabs);

    assert_eq!(
        result,
        Err(BuildError::LookupFailure {
            prototype: key("dragon")
        })
    );
    assert_eq!(pool.instantiated_count(), 0);
}

#[test]
fn releasing_twice_is_rejected() {
    let mut pool = ObjectPool::new(catalog());
    let id = pool
        .acquire(&key("barrel"), Transform::IDENTITY, Parent::Prefabs)
        .expect("known prototype");

    assert!(pool.is_active(id));
    pool.release(id).expect("first release succeeds");
    assert!(!pool.is_active(id));

    assert_eq!(
        pool.release(id),
        Err(BuildError::StateConflict(Conflict::NotActive(id)))
    );
    assert_eq!(pool.inactive_count(&key("barrel")), 1, "entry must be queued once");
}

#[test]
fn releasing_unknown_handle_is_a_missing_target() {
    let mut pool = ObjectPool::new(catalog());
    assert!(matches!(
        pool.release(RepresentationId::new(42)),
        Err(BuildError::MissingTarget(_))
    ));
}

#[test]
fn prewarm_fills_queues_and_skips_unknown_prototypes() {
    let mut pool = ObjectPool::new(catalog());

    let created = pool.prewarm(&[
        PrewarmEntry::new(key("tile"), 4),
        PrewarmEntry::new(key("dragon"), 3),
        PrewarmEntry::new(key("barrel"), 0),
    ]);

    assert_eq!(created, 4);
    assert_eq!(pool.inactive_count(&key("tile")), 4);
    assert_eq!(pool.active_count(), 0);

    for _ in 0..4 {
        let _ = pool
            .acquire(&key("tile"), Transform::IDENTITY, Parent::Layout)
            .expect("known prototype");
    }
    assert_eq!(pool.instantiated_count(), 4, "prewarmed entries cover first use");
}

#[test]
fn pool_never_issues_an_active_handle_twice() {
    let mut pool = ObjectPool::new(catalog());
    let mut active: BTreeSet<RepresentationId> = BTreeSet::new();
    let mut state: u64 = 0x9e37_79b9_7f4a_7c15;

    for _ in 0..500 {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let release = (state >> 40) % 3 == 0;

        if release && !active.is_empty() {
            let index = ((state >> 20) as usize) % active.len();
            let id = *active.iter().nth(index).expect("index in range");
            pool.release(id).expect("tracked handles are active");
            let _ = active.remove(&id);
            assert!(pool.is_queued(id));
        } else {
            let id = pool
                .acquire(&key("barrel"), Transform::IDENTITY, Parent::Prefabs)
                .expect("known prototype");
            assert!(active.insert(id), "handle {id} issued while already active");
            assert!(!pool.is_queued(id), "handle {id} is both active and queued");
        }
    }

    assert_eq!(pool.active_count(), active.len());
    assert_eq!(
        pool.active_count() + pool.inactive_count(&key("barrel")),
        pool.instantiated_count()
    );
}
