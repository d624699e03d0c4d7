use super::*;
use crate::test_support::{TWO_ARTBOARDS, native_file};

fn instance(file: FileId, generation: u64) -> ArtboardInstance {
    let native = native_file(TWO_ARTBOARDS).instance_artboard(0).unwrap();
    let catalog = ArtboardCatalog::build(native.as_ref(), None);
    ArtboardInstance {
        file,
        file_generation: generation,
        native,
        state_machine: None,
        catalog,
    }
}

#[test]
fn freed_ids_become_stale_and_slots_are_reused() {
    let mut arena = InstanceArena::default();
    let a = arena.allocate();
    arena.free(a);
    assert!(!arena.contains(a));

    let b = arena.allocate();
    assert_eq!(a.index(), b.index());
    assert_ne!(a.generation(), b.generation());
    assert!(!arena.install(a, instance(FileId(1), 1)));
    assert!(arena.install(b, instance(FileId(1), 1)));
    assert_eq!(arena.lifecycle(a), Lifecycle::Uninitialized);
    assert_eq!(arena.lifecycle(b), Lifecycle::Initialized);
}

#[test]
fn lifecycle_moves_through_initializing() {
    let mut arena = InstanceArena::default();
    let id = arena.allocate();
    assert_eq!(arena.lifecycle(id), Lifecycle::Uninitialized);
    assert!(arena.begin_initialize(id));
    assert_eq!(arena.lifecycle(id), Lifecycle::Initializing);
    arena.install(id, instance(FileId(1), 1));
    assert!(arena.instance(id).is_some());
    arena.reset(id);
    assert!(arena.instance(id).is_none());
    assert_eq!(arena.lifecycle(id), Lifecycle::Uninitialized);
}

#[test]
fn begin_initialize_drops_the_previous_instance() {
    let mut arena = InstanceArena::default();
    let id = arena.allocate();
    arena.install(id, instance(FileId(1), 1));
    arena.stash_events(id, Vec::new());
    assert!(arena.begin_initialize(id));
    assert!(arena.instance(id).is_none());
    assert!(arena.instance_mut(id).is_none());
    assert!(arena.take_stashed_events(id).is_empty());
    assert_eq!(arena.lifecycle(id), Lifecycle::Initializing);
}

#[test]
fn file_invalidation_targets_generation_then_whole_file() {
    let mut arena = InstanceArena::default();
    let old = arena.allocate();
    let new = arena.allocate();
    let other = arena.allocate();
    arena.install(old, instance(FileId(1), 1));
    arena.install(new, instance(FileId(1), 2));
    arena.install(other, instance(FileId(2), 1));
    arena.register_file(FileId(1), 2);

    assert_eq!(arena.invalidate_file_generation(FileId(1), 1), 1);
    assert!(arena.instance(old).is_none());
    assert!(arena.instance(new).is_some());
    assert!(arena.file_is_live(FileId(1), 2));

    assert_eq!(arena.retire_file(FileId(1)), 1);
    assert!(!arena.file_is_live(FileId(1), 2));
    assert!(arena.instance(other).is_some());
    assert_eq!(arena.len(), 3);
}

#[test]
fn stashed_events_are_taken_once() {
    let mut arena = InstanceArena::default();
    let id = arena.allocate();
    let report = crate::event::EventReport {
        name: "E".to_string(),
        type_tag: crate::event::type_tag::EVENT,
        delay_seconds: 0.0,
        properties: Vec::new(),
    };
    arena.stash_events(id, vec![RiveEvent::from_report(&report)]);
    assert_eq!(arena.take_stashed_events(id).len(), 1);
    assert!(arena.take_stashed_events(id).is_empty());
}

#[test]
fn thread_lock_clones_share_the_arena() {
    let lock = ThreadLock::new();
    let clone = lock.clone();
    let id = lock.lock().allocate();
    assert!(clone.lock().contains(id));
    assert!(lock.same_as(&clone));
    assert!(!lock.same_as(&ThreadLock::new()));
}
